use crate::common::world::PagerWorld;
use cucumber::gherkin::Step;
use cucumber::{given, when};
use rat::ModeRegistry;
use tracing::info;

#[given(regex = r"^a terminal of (\d+)x(\d+)$")]
async fn given_terminal_size(world: &mut PagerWorld, width: u16, height: u16) {
    world.terminal_size = (width, height);
}

#[given("a mode file:")]
async fn given_mode_file(world: &mut PagerWorld, step: &Step) {
    let text = step.docstring.as_deref().unwrap_or("");
    world.registry = ModeRegistry::from_ini_str(text).expect("mode file should parse");
    info!("loaded modes {:?}", world.registry.names());
}

#[when(regex = r#"^I run "([^"]+)"$"#)]
async fn when_run(world: &mut PagerWorld, command: String) {
    world.start(&command, "").expect("command should start");
}

#[when(regex = r#"^I run "([^"]+)" with modes "([^"]*)"$"#)]
async fn when_run_with_modes(world: &mut PagerWorld, command: String, modes: String) {
    world.start(&command, &modes).expect("command should start");
}
