use crate::common::world::PagerWorld;
use cucumber::then;

#[then(regex = r"^the cursor should be on line (\d+)$")]
async fn then_cursor_line(world: &mut PagerWorld, line: usize) {
    assert_eq!(world.top_pager().cursor_line(), line);
}

#[then(regex = r"^the scroll offset should be (\d+)$")]
async fn then_scroll_offset(world: &mut PagerWorld, offset: usize) {
    assert_eq!(world.top_pager().scroll_offset(), offset);
}

#[then(regex = r"^the pager should hold (\d+) lines$")]
async fn then_total_lines(world: &mut PagerWorld, lines: usize) {
    assert_eq!(world.top_pager().total_lines(), lines);
}

#[then(regex = r#"^line (\d+) should be annotated with "([^"]+)" = "([^"]*)"$"#)]
async fn then_line_annotated(world: &mut PagerWorld, line: usize, class: String, value: String) {
    let annotations = world.top_pager().line_annotations(line);
    assert!(
        annotations.contains(&(class.clone(), value.clone())),
        "line {line} has {annotations:?}, expected {class}={value}"
    );
}

#[then(regex = r"^(\d+) pagers? should be open$")]
async fn then_pager_count(world: &mut PagerWorld, count: usize) {
    assert_eq!(world.controller().pagers().len(), count);
}

#[then(regex = r#"^the top pager should be running "(.+)"$"#)]
async fn then_top_command(world: &mut PagerWorld, command: String) {
    assert_eq!(world.top_pager().interpolated_command(), command);
}

#[then(regex = r#"^the screen should show "(.+)"$"#)]
async fn then_screen_shows(world: &mut PagerWorld, text: String) {
    let frame = world.render_frame().expect("frame should render");
    assert!(frame.contains(&text), "frame {frame:?} lacks {text:?}");
}

#[then("the first line should differ from the remembered one")]
async fn then_first_line_changed(world: &mut PagerWorld) {
    let remembered = world.remembered_line.clone().expect("nothing remembered");
    let current = world.top_pager().line_text(0).expect("no output");
    assert_ne!(remembered, current);
}

#[then("the app should have quit")]
async fn then_app_quit(world: &mut PagerWorld) {
    assert!(world.controller().should_quit());
}

#[then("the app should still be running")]
async fn then_app_running(world: &mut PagerWorld) {
    assert!(!world.controller().should_quit());
}
