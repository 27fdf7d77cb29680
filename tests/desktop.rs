// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end desktop scenarios: mapping, geometry state machines,
//! hit-testing, and enter/leave bookkeeping.

use std::collections::HashMap;

use calloop::EventLoop;
use veld::config::Config;
use veld::desktop::layout::LayoutEntry;
use veld::desktop::view::DecoPart;
use veld::desktop::{OutputId, ViewId};
use veld::shell::{Shell, ShellPopup, ShellRequest, WlShellRole, WlShellSurface, X11Surface, XdgSurfaceV6};
use veld::state::State;
use veld::utils::geometry::{Rect, rotate_from_surface};
use veld::wayland::decoration::DecorationMode;
use veld::wayland::surface::{Surface, SurfaceEvent};

fn new_state(config: Config) -> (EventLoop<'static, State>, State) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    let event_loop = EventLoop::try_new().expect("event loop");
    let state = State::new(config, event_loop.handle(), event_loop.get_signal());
    (event_loop, state)
}

fn entry(x: i32, y: i32, width: i32, height: i32) -> LayoutEntry {
    LayoutEntry {
        x,
        y,
        width,
        height,
    }
}

/// Commit an initial size and bind the surface to the desktop.
fn map_view(state: &mut State, shell: Shell, width: i32, height: i32) -> (ViewId, Surface) {
    let surface = state.desktop.globals.compositor.create_surface();
    surface.set_pending_size(width, height);
    state.commit_surface(&surface);
    let id = state.add_view(shell, surface.clone());
    (id, surface)
}

fn map_xdg_view(state: &mut State, width: i32, height: i32) -> (ViewId, Surface) {
    map_view(state, Shell::XdgV6(XdgSurfaceV6::new()), width, height)
}

/// The client acknowledging a configure: commit the requested size.
fn ack_resize(state: &mut State, surface: &Surface, width: i32, height: i32) {
    surface.set_pending_size(width, height);
    state.commit_surface(surface);
}

/// P1: every fullscreen linkage is mutual and per-output unique.
fn assert_fullscreen_consistent(state: &State) {
    for (output, binding) in state.desktop.output_bindings() {
        if let Some(id) = binding.fullscreen_view {
            let view = state.desktop.view(id).expect("fullscreen view exists");
            assert_eq!(view.fullscreen_output, Some(output));
        }
    }
    for view in state.desktop.views() {
        if let Some(output) = view.fullscreen_output {
            let binding = state.desktop.output(output).expect("output exists");
            assert_eq!(binding.fullscreen_view, Some(view.id));
        }
    }
}

#[test]
fn maximize_restore_round_trip() {
    let (_loop, mut state) = new_state(Config::default());
    state.desktop.add_output("OUT-1", entry(0, 0, 1920, 1080));

    let (view, surface) = map_xdg_view(&mut state, 400, 300);
    state.desktop.move_view(view, 100.0, 200.0);
    state.desktop.rotate_view(view, 0.5);

    state.desktop.maximize_view(view, true);
    {
        let view = state.desktop.view(view).unwrap();
        assert!(view.maximized);
        assert_eq!(view.rotation, 0.0);
        let saved = view.saved();
        assert_eq!(
            (saved.x, saved.y, saved.rotation, saved.width, saved.height),
            (100.0, 200.0, 0.5, 400, 300)
        );
    }

    // the client takes the offered size; the parked position lands with it
    ack_resize(&mut state, &surface, 1920, 1080);
    {
        let view = state.desktop.view(view).unwrap();
        assert_eq!((view.x, view.y), (0.0, 0.0));
        assert_eq!((view.width, view.height), (1920, 1080));
    }

    state.desktop.maximize_view(view, false);
    ack_resize(&mut state, &surface, 400, 300);
    {
        let view = state.desktop.view(view).unwrap();
        assert!(!view.maximized);
        assert_eq!((view.x, view.y), (100.0, 200.0));
        assert_eq!((view.width, view.height), (400, 300));
        assert_eq!(view.rotation, 0.5);
    }
}

#[test]
fn maximize_is_idempotent() {
    let (_loop, mut state) = new_state(Config::default());
    state.desktop.add_output("OUT-1", entry(0, 0, 1920, 1080));

    let (view, surface) = map_xdg_view(&mut state, 400, 300);
    state.desktop.move_view(view, 100.0, 200.0);
    state.desktop.maximize_view(view, true);
    ack_resize(&mut state, &surface, 1920, 1080);

    // a second maximize must not clobber the saved geometry
    state.desktop.maximize_view(view, true);
    let saved = state.desktop.view(view).unwrap().saved();
    assert_eq!((saved.x, saved.y), (100.0, 200.0));
}

#[test]
fn fullscreen_round_trip_restores_saved() {
    let (_loop, mut state) = new_state(Config::default());
    let output = state.desktop.add_output("OUT-1", entry(0, 0, 1280, 720));

    let (view, surface) = map_xdg_view(&mut state, 500, 400);
    state.desktop.move_view(view, 40.0, 60.0);
    state.desktop.rotate_view(view, 0.3);

    // derive the output from the view center
    state.desktop.set_view_fullscreen(view, true, None);
    assert_fullscreen_consistent(&state);
    {
        let view_ref = state.desktop.view(view).unwrap();
        assert_eq!(view_ref.fullscreen_output, Some(output));
        assert_eq!(view_ref.rotation, 0.0);
    }
    assert_eq!(
        state.desktop.output(output).unwrap().fullscreen_view,
        Some(view)
    );
    ack_resize(&mut state, &surface, 1280, 720);

    state.desktop.set_view_fullscreen(view, false, None);
    ack_resize(&mut state, &surface, 500, 400);
    assert_fullscreen_consistent(&state);
    {
        let view = state.desktop.view(view).unwrap();
        assert_eq!(view.fullscreen_output, None);
        assert_eq!((view.x, view.y), (40.0, 60.0));
        assert_eq!((view.width, view.height), (500, 400));
        assert_eq!(view.rotation, 0.3);
    }
    assert_eq!(state.desktop.output(output).unwrap().fullscreen_view, None);
}

#[test]
fn fullscreen_shadows_other_views_on_its_output() {
    let (_loop, mut state) = new_state(Config::default());
    let _a = state.desktop.add_output("OUT-A", entry(0, 0, 800, 600));
    let b = state.desktop.add_output("OUT-B", entry(800, 0, 800, 600));

    let (fullscreen, surface) = map_xdg_view(&mut state, 640, 480);
    state.desktop.set_view_fullscreen(fullscreen, true, Some(b));
    ack_resize(&mut state, &surface, 800, 600);

    // a floating view mapped later sits above in Z-order
    let (floating, _) = map_xdg_view(&mut state, 200, 200);
    state.desktop.move_view(floating, 850.0, 100.0);

    let hit = state.desktop.view_at(900.0, 150.0).expect("hit");
    assert_eq!(hit.view, fullscreen);
    assert_fullscreen_consistent(&state);

    // outside the fullscreen output the floating view is reachable again
    state.desktop.move_view(floating, 100.0, 100.0);
    let hit = state.desktop.view_at(150.0, 150.0).expect("hit");
    assert_eq!(hit.view, floating);
}

#[test]
fn layout_shrink_relocates_stranded_views() {
    let (_loop, mut state) = new_state(Config::default());
    let _first = state.desktop.add_output("OUT-1", entry(0, 0, 1024, 768));
    let second = state.desktop.add_output("OUT-2", entry(1024, 0, 1024, 768));

    let (view, _) = map_xdg_view(&mut state, 200, 200);
    state.desktop.move_view(view, 1500.0, 100.0);

    state.desktop.remove_output(second);

    let view = state.desktop.view(view).unwrap();
    assert_eq!((view.x, view.y), (412.0, 284.0));
}

#[test]
fn layout_change_keeps_partially_visible_views_in_place() {
    let (_loop, mut state) = new_state(Config::default());
    let _first = state.desktop.add_output("OUT-1", entry(0, 0, 1024, 768));
    let second = state.desktop.add_output("OUT-2", entry(1024, 0, 1024, 768));

    let (view, _) = map_xdg_view(&mut state, 200, 200);
    // straddles both outputs
    state.desktop.move_view(view, 1000.0, 100.0);

    state.desktop.remove_output(second);
    let view = state.desktop.view(view).unwrap();
    assert_eq!((view.x, view.y), (1000.0, 100.0));
}

#[test]
fn decorated_titlebar_hit() {
    let config = Config {
        titlebar_height: 20,
        ..Config::default()
    };
    let (_loop, mut state) = new_state(config);
    state.desktop.add_output("OUT-1", entry(0, 0, 1920, 1080));

    let surface = state.desktop.globals.compositor.create_surface();
    state
        .desktop
        .globals
        .decoration_manager
        .set_surface_mode(&surface, DecorationMode::ServerSide);
    surface.set_pending_size(200, 100);
    state.commit_surface(&surface);
    let view = state.add_view(Shell::XdgV6(XdgSurfaceV6::new()), surface);
    assert!(state.desktop.view(view).unwrap().decorated);

    state.desktop.move_view(view, 50.0, 50.0);
    let hit = state.desktop.view_at(55.0, 45.0).expect("titlebar hit");
    assert_eq!(hit.view, view);
    assert!(hit.surface.is_none());
    assert_eq!(hit.deco, DecoPart::TITLEBAR);
    assert!(hit.sx > 0.0 && hit.sx < 200.0);
    assert!(hit.sy > -20.0 && hit.sy < 0.0);
}

#[test]
fn popup_takes_precedence_over_the_root_surface() {
    let (_loop, mut state) = new_state(Config::default());
    state.desktop.add_output("OUT-1", entry(0, 0, 1920, 1080));

    let xdg = XdgSurfaceV6::new();
    let popup_surface = Surface::new();
    popup_surface.set_pending_size(50, 50);
    state.commit_surface(&popup_surface);
    xdg.add_popup(ShellPopup::new(popup_surface.clone(), 10.0, 10.0));

    let (view, _) = map_view(&mut state, Shell::XdgV6(xdg), 200, 200);

    let hit = state.desktop.view_at(30.0, 30.0).expect("popup hit");
    assert_eq!(hit.view, view);
    assert_eq!(hit.surface, Some(popup_surface));
    assert_eq!((hit.sx, hit.sy), (20.0, 20.0));
}

#[test]
fn subsurface_hit_returns_child_local_coordinates() {
    let (_loop, mut state) = new_state(Config::default());
    state.desktop.add_output("OUT-1", entry(0, 0, 1920, 1080));

    let (view, surface) = map_xdg_view(&mut state, 200, 200);
    let child_surface = Surface::new();
    child_surface.set_pending_size(50, 50);
    state.commit_surface(&child_surface);
    state.add_subsurface(&surface, child_surface.clone(), 20.0, 30.0);

    let hit = state.desktop.view_at(30.0, 40.0).expect("subsurface hit");
    assert_eq!(hit.view, view);
    assert_eq!(hit.surface, Some(child_surface));
    assert_eq!((hit.sx, hit.sy), (10.0, 10.0));
}

#[test]
fn wl_shell_popup_views_are_skipped_at_top_level() {
    let (_loop, mut state) = new_state(Config::default());
    state.desktop.add_output("OUT-1", entry(0, 0, 1920, 1080));

    let shell = Shell::Wl(WlShellSurface::new(WlShellRole::Popup));
    let (_view, _) = map_view(&mut state, shell, 100, 100);

    assert!(state.desktop.view_at(50.0, 50.0).is_none());
}

#[test]
fn hit_test_respects_z_order() {
    let (_loop, mut state) = new_state(Config::default());
    state.desktop.add_output("OUT-1", entry(0, 0, 1920, 1080));

    let (below, _) = map_xdg_view(&mut state, 300, 300);
    let (above, _) = map_xdg_view(&mut state, 300, 300);

    assert_eq!(state.desktop.view_at(50.0, 50.0).unwrap().view, above);

    state.desktop.raise_view(below);
    assert_eq!(state.desktop.view_at(50.0, 50.0).unwrap().view, below);
}

#[test]
fn input_region_limits_primary_surface_hits() {
    let (_loop, mut state) = new_state(Config::default());
    state.desktop.add_output("OUT-1", entry(0, 0, 1920, 1080));

    let (view, surface) = map_xdg_view(&mut state, 200, 200);
    surface.set_pending_input_region(Some(vec![Rect::new(0, 0, 100, 100)]));
    state.commit_surface(&surface);

    assert_eq!(state.desktop.view_at(50.0, 50.0).unwrap().view, view);
    assert!(state.desktop.view_at(150.0, 150.0).is_none());
}

#[test]
fn enter_leave_parity_across_moves() {
    let (_loop, mut state) = new_state(Config::default());
    let a = state.desktop.add_output("OUT-A", entry(0, 0, 800, 600));
    let b = state.desktop.add_output("OUT-B", entry(800, 0, 800, 600));

    let (view, surface) = map_xdg_view(&mut state, 200, 200);
    state.desktop.update_view_outputs(view, None);

    let mut balance: HashMap<OutputId, i32> = HashMap::new();
    let mut tally = |surface: &Surface, balance: &mut HashMap<OutputId, i32>| {
        for event in surface.take_events() {
            match event {
                SurfaceEvent::Enter(output) => *balance.entry(output).or_default() += 1,
                SurfaceEvent::Leave(output) => *balance.entry(output).or_default() -= 1,
            }
        }
    };

    tally(&surface, &mut balance);
    assert_eq!(balance.get(&a), Some(&1));
    assert_eq!(balance.get(&b), None);

    // straddle both outputs
    state.desktop.move_view(view, 700.0, 100.0);
    tally(&surface, &mut balance);
    assert_eq!(balance.get(&a), Some(&1));
    assert_eq!(balance.get(&b), Some(&1));

    // fully onto B
    state.desktop.move_view(view, 900.0, 100.0);
    tally(&surface, &mut balance);
    assert_eq!(balance.get(&a), Some(&0));
    assert_eq!(balance.get(&b), Some(&1));

    // off every output
    state.desktop.move_view(view, 2000.0, 100.0);
    tally(&surface, &mut balance);
    assert_eq!(balance.get(&a), Some(&0));
    assert_eq!(balance.get(&b), Some(&0));

    // and back again
    state.desktop.move_view(view, 100.0, 100.0);
    tally(&surface, &mut balance);
    assert_eq!(balance.get(&a), Some(&1));
    assert_eq!(balance.get(&b), Some(&0));
}

#[test]
fn rotated_hit_test_inverts_the_render_transform() {
    let (_loop, mut state) = new_state(Config::default());
    state.desktop.add_output("OUT-1", entry(0, 0, 1920, 1080));

    let (view, surface) = map_xdg_view(&mut state, 200, 100);
    state.desktop.move_view(view, 300.0, 200.0);
    state.desktop.rotate_view(view, 0.7);

    let (surface_x, surface_y) = (30.0, 40.0);
    let (view_x, view_y) = rotate_from_surface(surface_x, surface_y, 200, 100, 0.7);
    let hit = state
        .desktop
        .view_at(300.0 + view_x, 200.0 + view_y)
        .expect("rotated hit");
    assert_eq!(hit.view, view);
    assert_eq!(hit.surface, Some(surface));
    assert!((hit.sx - surface_x).abs() < 1e-9);
    assert!((hit.sy - surface_y).abs() < 1e-9);
}

#[test]
fn listeners_are_released_on_view_destroy() {
    let (_loop, mut state) = new_state(Config::default());
    state.desktop.add_output("OUT-1", entry(0, 0, 1920, 1080));

    let (view, surface) = map_xdg_view(&mut state, 200, 200);
    assert!(surface.listener_count() > 0);

    let child_surface = Surface::new();
    child_surface.set_pending_size(50, 50);
    state.commit_surface(&child_surface);
    let sub = state.add_subsurface(&surface, child_surface.clone(), 5.0, 5.0);
    assert!(child_surface.listener_count() > 0);
    assert_eq!(sub.destroy_listener_count(), 1);

    // a nested subsurface still binds to the same view
    let nested_surface = Surface::new();
    nested_surface.set_pending_size(20, 20);
    state.commit_surface(&nested_surface);
    let nested = state.add_subsurface(&child_surface, nested_surface.clone(), 2.0, 2.0);
    assert!(nested_surface.listener_count() > 0);

    state.remove_view(view);
    assert_eq!(surface.listener_count(), 0);
    assert_eq!(child_surface.listener_count(), 0);
    assert_eq!(nested_surface.listener_count(), 0);
    assert_eq!(sub.destroy_listener_count(), 0);
    assert_eq!(nested.destroy_listener_count(), 0);
    assert!(state.desktop.view(view).is_none());
}

#[test]
fn subsurface_destroy_unlinks_its_child() {
    let (_loop, mut state) = new_state(Config::default());
    state.desktop.add_output("OUT-1", entry(0, 0, 1920, 1080));

    let (_view, surface) = map_xdg_view(&mut state, 200, 200);
    let child_surface = Surface::new();
    child_surface.set_pending_size(50, 50);
    state.commit_surface(&child_surface);
    let sub = state.add_subsurface(&surface, child_surface.clone(), 5.0, 5.0);

    state.destroy_subsurface(&sub);
    assert_eq!(child_surface.listener_count(), 0);
    assert_eq!(sub.destroy_listener_count(), 0);
    // the view keeps its own registrations
    assert!(surface.listener_count() > 0);
    assert!(surface.subsurfaces().is_empty());
}

#[test]
fn view_destroy_signal_fires_once() {
    let (_loop, mut state) = new_state(Config::default());
    state.desktop.add_output("OUT-1", entry(0, 0, 1920, 1080));

    let (view, _) = map_xdg_view(&mut state, 200, 200);
    let fired = std::rc::Rc::new(std::cell::Cell::new(0));
    let observed = fired.clone();
    let _listener = state
        .desktop
        .view(view)
        .unwrap()
        .destroy_signal()
        .subscribe(move |_state, id: &ViewId| {
            assert_eq!(*id, view);
            observed.set(observed.get() + 1);
        });

    state.remove_view(view);
    state.remove_view(view);
    assert_eq!(fired.get(), 1);
}

#[test]
fn removing_a_fullscreen_view_clears_the_output_link() {
    let (_loop, mut state) = new_state(Config::default());
    let output = state.desktop.add_output("OUT-1", entry(0, 0, 800, 600));

    let (view, surface) = map_xdg_view(&mut state, 400, 300);
    state.desktop.set_view_fullscreen(view, true, Some(output));
    ack_resize(&mut state, &surface, 800, 600);

    state.remove_view(view);
    assert_eq!(state.desktop.output(output).unwrap().fullscreen_view, None);
    assert_fullscreen_consistent(&state);
}

#[test]
fn center_view_needs_a_seat_and_an_output() {
    let (_loop, mut state) = new_state(Config::default());
    let (view, _) = map_xdg_view(&mut state, 200, 100);

    // no seat yet
    state.desktop.add_output("OUT-1", entry(0, 0, 800, 600));
    let seatless = {
        let (desktop, input) = (&mut state.desktop, &state.input);
        desktop.center_view(view, input)
    };
    assert!(!seatless);

    let seat = state.input.add_seat("seat0");
    state.input.set_cursor(seat, 10.0, 10.0);
    let centered = {
        let (desktop, input) = (&mut state.desktop, &state.input);
        desktop.center_view(view, input)
    };
    assert!(centered);
    let view = state.desktop.view(view).unwrap();
    assert_eq!((view.x, view.y), (300.0, 250.0));
}

#[test]
fn center_view_uses_the_most_recent_seat() {
    let (_loop, mut state) = new_state(Config::default());
    state.desktop.add_output("OUT-A", entry(0, 0, 800, 600));
    state.desktop.add_output("OUT-B", entry(800, 0, 800, 600));
    let (view, _) = map_xdg_view(&mut state, 200, 100);

    let idle_seat = state.input.add_seat("seat0");
    let busy_seat = state.input.add_seat("seat1");
    state.input.set_cursor(idle_seat, 10.0, 10.0);
    state.input.set_cursor(busy_seat, 900.0, 10.0);
    state.input.note_activity(idle_seat, 100, 0);
    state.input.note_activity(busy_seat, 100, 500);

    let (desktop, input) = (&mut state.desktop, &state.input);
    assert!(desktop.center_view(view, input));
    let view = state.desktop.view(view).unwrap();
    // centered on OUT-B, under the busier seat's cursor
    assert_eq!((view.x, view.y), (1100.0, 250.0));
}

#[test]
fn setup_view_focuses_centers_and_enters() {
    let (_loop, mut state) = new_state(Config::default());
    let a = state.desktop.add_output("OUT-A", entry(0, 0, 800, 600));
    let seat = state.input.add_seat("seat0");
    state.input.set_cursor(seat, 100.0, 100.0);

    let (view, surface) = map_xdg_view(&mut state, 200, 100);
    surface.take_events();
    state.setup_view(view);

    assert_eq!(state.input.seat(seat).unwrap().focus, Some(view));
    let events = surface.take_events();
    assert!(events.contains(&SurfaceEvent::Enter(a)));
    let view = state.desktop.view(view).unwrap();
    assert_eq!((view.x, view.y), (300.0, 250.0));
}

#[test]
fn pending_move_resize_waits_for_the_matching_commit() {
    let (_loop, mut state) = new_state(Config::default());
    state.desktop.add_output("OUT-1", entry(0, 0, 1920, 1080));

    let (view, surface) = map_xdg_view(&mut state, 400, 300);
    state.desktop.move_resize_view(view, 5.0, 7.0, 200, 150);
    assert_eq!(
        (
            state.desktop.view(view).unwrap().x,
            state.desktop.view(view).unwrap().y
        ),
        (0.0, 0.0)
    );

    // a commit with some other size leaves the position parked
    ack_resize(&mut state, &surface, 210, 160);
    assert_eq!((state.desktop.view(view).unwrap().x), 0.0);

    ack_resize(&mut state, &surface, 200, 150);
    let view = state.desktop.view(view).unwrap();
    assert_eq!((view.x, view.y), (5.0, 7.0));
    assert_eq!((view.width, view.height), (200, 150));
}

#[test]
fn move_resize_without_position_change_is_a_resize() {
    let (_loop, mut state) = new_state(Config::default());
    state.desktop.add_output("OUT-1", entry(0, 0, 1920, 1080));

    let xdg = XdgSurfaceV6::new();
    let (view, _) = map_view(&mut state, Shell::XdgV6(xdg.clone()), 400, 300);
    state.desktop.move_resize_view(view, 0.0, 0.0, 200, 150);

    let requests = Shell::XdgV6(xdg).take_requests();
    assert_eq!(
        requests,
        vec![ShellRequest::Configure {
            width: 200,
            height: 150
        }]
    );
}

#[test]
fn x11_views_move_resize_atomically() {
    let (_loop, mut state) = new_state(Config::default());
    state.desktop.add_output("OUT-1", entry(0, 0, 1920, 1080));

    let x11 = X11Surface::new();
    let (view, surface) = map_view(&mut state, Shell::X11(x11.clone()), 400, 300);
    surface.take_events();

    state.desktop.move_resize_view(view, 10.0, 20.0, 300, 200);
    // the position lands immediately, the size on the X surface's commit
    {
        let view = state.desktop.view(view).unwrap();
        assert_eq!((view.x, view.y), (10.0, 20.0));
        assert_eq!((view.width, view.height), (400, 300));
    }
    let requests = Shell::X11(x11).take_requests();
    assert!(requests.contains(&ShellRequest::ConfigureWindow {
        x: 10,
        y: 20,
        width: 300,
        height: 200
    }));

    ack_resize(&mut state, &surface, 300, 200);
    let view = state.desktop.view(view).unwrap();
    assert_eq!((view.width, view.height), (300, 200));
}

#[test]
fn commit_damage_fans_out_to_intersecting_outputs() {
    let (_loop, mut state) = new_state(Config::default());
    let output = state.desktop.add_output("OUT-1", entry(0, 0, 1920, 1080));

    let (view, surface) = map_xdg_view(&mut state, 200, 200);
    state.desktop.move_view(view, 100.0, 100.0);
    // discard the mapping/move damage
    state.desktop.output(output).unwrap().damage.take();

    surface.add_pending_damage(Rect::new(10, 10, 20, 20));
    state.commit_surface(&surface);

    let snapshot = state.desktop.output(output).unwrap().damage.take();
    assert!(snapshot.rects.contains(&Rect::new(110, 110, 20, 20)));
    // surface damage is consumed by the fan-out
    assert!(surface.damage().is_empty());
}

#[test]
fn client_side_decorated_views_have_no_deco_parts() {
    let (_loop, mut state) = new_state(Config::default());
    state.desktop.add_output("OUT-1", entry(0, 0, 1920, 1080));

    let (view, _) = map_xdg_view(&mut state, 200, 100);
    assert!(!state.desktop.view(view).unwrap().decorated);
    state.desktop.move_view(view, 50.0, 50.0);
    // just above the surface, where a titlebar would be
    assert!(state.desktop.view_at(55.0, 45.0).is_none());
}

#[test]
fn output_lookup_by_name_is_linear() {
    let (_loop, mut state) = new_state(Config::default());
    let a = state.desktop.add_output("DP-1", entry(0, 0, 800, 600));
    let b = state.desktop.add_output("DP-2", entry(800, 0, 800, 600));

    assert_eq!(state.desktop.output_from_name("DP-1"), Some(a));
    assert_eq!(state.desktop.output_from_name("DP-2"), Some(b));
    assert_eq!(state.desktop.output_from_name("HDMI-1"), None);
}

#[test]
fn close_and_activate_delegate_to_the_shell() {
    let (_loop, mut state) = new_state(Config::default());
    state.desktop.add_output("OUT-1", entry(0, 0, 1920, 1080));

    let xdg = XdgSurfaceV6::new();
    let (view, _) = map_view(&mut state, Shell::XdgV6(xdg.clone()), 200, 200);
    state.desktop.activate_view(view, true);
    state.desktop.close_view(view);

    assert_eq!(
        Shell::XdgV6(xdg).take_requests(),
        vec![ShellRequest::SetActivated(true), ShellRequest::Close]
    );
}
