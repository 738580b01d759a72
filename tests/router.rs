// axum panics at router construction time when two routes conflict, so
// building the full app is a meaningful smoke test on its own.
#[test]
fn router_builds_without_route_conflicts() {
    let _ = xclubs_backend::app();
}
