mod common;

use bevy_danmaku::pool::DanmakuPool;

#[test]
fn boots_and_ticks() {
    let mut app = common::app_headless(16);

    for _ in 0..3 {
        common::tick(&mut app);
    }

    // The pool pre-spawned its full capacity and nothing has claimed a bullet.
    let pool = app.world().resource::<DanmakuPool>();
    assert_eq!(pool.available(), 16);
    assert_eq!(pool.capacity(), 16);
}
