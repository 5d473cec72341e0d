//! Property-based tests for shell state invariants
//!
//! These tests verify that invariants hold across arbitrary sequences of operations.

use proptest::prelude::*;
use rootshell::{ResizeTicket, ViewAdapter};
use test_harness::fixtures::{constrained_toplevel, mapped_toplevel, shell_with_seats};

#[derive(Debug, Clone)]
enum Op {
    Toplevel,
    Popup { parent: usize },
    Destroy { target: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Toplevel),
        (0usize..16).prop_map(|parent| Op::Popup { parent }),
        (0usize..16).prop_map(|target| Op::Destroy { target }),
    ]
}

proptest! {
    /// Live listeners always match the live views and popups
    #[test]
    fn listener_count_matches_live_objects(ops in prop::collection::vec(op(), 1..30)) {
        let mut ts = shell_with_seats();
        let mut surfaces = Vec::new();

        for op in ops {
            match op {
                Op::Toplevel => {
                    let (surface, _) = ts.map_toplevel(100, 100).unwrap();
                    surfaces.push(surface);
                }
                Op::Popup { parent } if !surfaces.is_empty() => {
                    let parent = surfaces[parent % surfaces.len()];
                    let popup = ts.create_popup(parent, (0, 0, 20, 20)).unwrap();
                    surfaces.push(popup);
                }
                Op::Destroy { target } if !surfaces.is_empty() => {
                    let surface = surfaces[target % surfaces.len()];
                    ts.destroy(surface).unwrap();
                    surfaces.retain(|s| ts.shell().surface(*s).is_some());
                }
                _ => {}
            }

            let snapshot = ts.snapshot();
            prop_assert_eq!(
                snapshot.listener_count,
                9 * snapshot.view_count + 5 * snapshot.popup_count,
                "listeners must belong to live views and popups"
            );
        }
    }

    /// Whatever move/resizes were issued, once the client catches up the
    /// view ends at the last requested position
    #[test]
    fn last_move_resize_wins(
        requests in prop::collection::vec((-500i32..500, -500i32..500, 1u32..1000, 1u32..1000), 1..8),
    ) {
        let (mut ts, surface, view) = mapped_toplevel();

        for (x, y, width, height) in &requests {
            ts.shell_mut().move_resize(view, *x, *y, *width, *height);
        }

        if !ts.inflight_serials(surface).is_empty() {
            ts.ack_latest(surface).unwrap();
        }
        let state = ts.last_toplevel_configure(surface).unwrap();
        ts.commit_buffer(surface, state.width as i32, state.height as i32).unwrap();

        let (x, y, _, _) = *requests.last().unwrap();
        prop_assert_eq!(ts.position(view), Some((x, y)));
        prop_assert_eq!(ts.ticket(view), Some(ResizeTicket::Idle));
    }

    /// Configured sizes never fall below the client's minimum
    #[test]
    fn configured_size_respects_min(
        min in (1u32..500, 1u32..500),
        sizes in prop::collection::vec((0u32..1000, 0u32..1000), 1..10),
    ) {
        let (mut ts, surface, view) = constrained_toplevel(min.0, min.1);

        for (width, height) in sizes {
            ts.shell_mut().resize(view, width, height);
            if let Some(state) = ts.last_toplevel_configure(surface) {
                prop_assert!(state.width >= min.0 && state.height >= min.1);
            }
        }
    }
}
