use crate::common::world::PagerWorld;
use cucumber::when;
use rat::Pager;
use tracing::debug;

#[when(regex = r#"^I press "([^"]+)"$"#)]
async fn when_press(world: &mut PagerWorld, key: String) {
    debug!("pressing {}", key);
    world.press(&key).expect("key should be handled");
}

#[when(regex = r#"^I press "([^"]+)" (\d+) times$"#)]
async fn when_press_times(world: &mut PagerWorld, key: String, times: usize) {
    for _ in 0..times {
        world.press(&key).expect("key should be handled");
    }
}

#[when("I wait for the output to finish")]
async fn when_wait_for_output(world: &mut PagerWorld) {
    world
        .wait_for("output to finish", Pager::is_finished)
        .await
        .expect("command should finish");
}

#[when(regex = r"^I wait for (\d+) annotations?$")]
async fn when_wait_for_annotations(world: &mut PagerWorld, count: usize) {
    world
        .wait_for("annotations", |pager| pager.annotation_count() >= count)
        .await
        .expect("annotators should catch up");
}

#[when("I remember the first line")]
async fn when_remember_first_line(world: &mut PagerWorld) {
    world.remembered_line = world.top_pager().line_text(0);
}
