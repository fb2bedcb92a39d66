//! Translate winit input into orbit-control commands.

use std::collections::HashMap;

use gallery_math::{NavigationKey, Vec2};
use gallery_viewport::GalleryView;
use winit::event::{
    ElementState, KeyEvent, MouseButton, MouseScrollDelta, Touch, TouchPhase, WindowEvent,
};
use winit::keyboard::{Key, ModifiersState, NamedKey};

/// Pixels per wheel line, matching a browser's line-mode scroll
const LINE_HEIGHT: f32 = 100.0;

/// Something the input layer wants the app to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputAction {
    None,
    /// Refetch gallery data and rebuild the scene
    Refresh,
}

/// Map a logical key to a navigation step.
pub fn navigation_key(key: &Key) -> Option<NavigationKey> {
    match key {
        Key::Named(NamedKey::ArrowLeft) => Some(NavigationKey::RotateLeft),
        Key::Named(NamedKey::ArrowRight) => Some(NavigationKey::RotateRight),
        Key::Named(NamedKey::ArrowUp) => Some(NavigationKey::RotateUp),
        Key::Named(NamedKey::ArrowDown) => Some(NavigationKey::RotateDown),
        Key::Character(text) => match text.as_str() {
            "+" | "=" => Some(NavigationKey::ZoomIn),
            "-" | "_" => Some(NavigationKey::ZoomOut),
            "r" | "R" => Some(NavigationKey::Reset),
            _ => None,
        },
        _ => None,
    }
}

/// Wheel delta in DOM convention: positive scrolls away from the user.
pub fn wheel_delta(delta: &MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * LINE_HEIGHT,
        MouseScrollDelta::PixelDelta(position) => -position.y as f32,
    }
}

/// Centroid and spread of the first two touches.
fn two_finger(touches: &HashMap<u64, Vec2>) -> Option<(Vec2, f32)> {
    let mut points = touches.values();
    let a = *points.next()?;
    let b = *points.next()?;
    Some(((a + b) * 0.5, a.distance(b)))
}

#[derive(Default)]
pub struct InputState {
    left_pressed: bool,
    right_pressed: bool,
    last_cursor: Option<Vec2>,
    touches: HashMap<u64, Vec2>,
    modifiers: ModifiersState,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one window event to the view's controls.
    pub fn handle(&mut self, event: &WindowEvent, view: &mut GalleryView) -> InputAction {
        let viewport_height = view.renderer.size.1 as f32;

        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::MouseInput { button, state, .. } => {
                let pressed = *state == ElementState::Pressed;
                if pressed {
                    view.controls.stop_auto_rotate();
                }
                match button {
                    MouseButton::Left => self.left_pressed = pressed,
                    MouseButton::Right => self.right_pressed = pressed,
                    _ => {}
                }
                if !self.left_pressed && !self.right_pressed {
                    self.last_cursor = None;
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                if self.left_pressed || self.right_pressed {
                    if let Some(last) = self.last_cursor {
                        let delta = position - last;
                        if self.left_pressed {
                            view.controls.orbit_drag(delta.x, delta.y, viewport_height);
                        } else {
                            view.controls
                                .pan_drag(&view.camera, delta.x, delta.y, viewport_height);
                        }
                    }
                    self.last_cursor = Some(position);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                view.controls.stop_auto_rotate();
                let delta_y = wheel_delta(delta);
                if self.modifiers.control_key() {
                    // Trackpad pinch arrives as ctrl + wheel
                    view.controls.trackpad_pinch(&mut view.camera, delta_y);
                } else {
                    view.controls.wheel(delta_y);
                }
            }
            WindowEvent::PinchGesture { delta, .. } => {
                view.controls.stop_auto_rotate();
                // Positive delta magnifies
                view.controls.trackpad_pinch(&mut view.camera, -*delta as f32);
            }
            WindowEvent::Touch(touch) => self.handle_touch(touch, view, viewport_height),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if *logical_key == Key::Named(NamedKey::F5) {
                    return InputAction::Refresh;
                }
                if let Some(key) = navigation_key(logical_key) {
                    view.controls.handle_key(&mut view.camera, key);
                }
            }
            _ => {}
        }

        InputAction::None
    }

    fn handle_touch(&mut self, touch: &Touch, view: &mut GalleryView, viewport_height: f32) {
        let position = Vec2::new(touch.location.x as f32, touch.location.y as f32);

        match touch.phase {
            TouchPhase::Started => {
                view.controls.stop_auto_rotate();
                self.touches.insert(touch.id, position);
            }
            TouchPhase::Moved => {
                let before = two_finger(&self.touches);
                let Some(previous) = self.touches.insert(touch.id, position) else {
                    return;
                };

                if self.touches.len() == 1 {
                    let delta = position - previous;
                    view.controls.orbit_drag(delta.x, delta.y, viewport_height);
                } else if let (Some((old_center, old_spread)), Some((center, spread))) =
                    (before, two_finger(&self.touches))
                {
                    let delta = center - old_center;
                    view.controls
                        .pan_drag(&view.camera, delta.x, delta.y, viewport_height);
                    if old_spread > f32::EPSILON {
                        view.controls.pinch_spread(spread / old_spread);
                    }
                }
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.touches.remove(&touch.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn test_navigation_keys() {
        assert_eq!(
            navigation_key(&Key::Named(NamedKey::ArrowLeft)),
            Some(NavigationKey::RotateLeft)
        );
        assert_eq!(
            navigation_key(&Key::Named(NamedKey::ArrowDown)),
            Some(NavigationKey::RotateDown)
        );
        assert_eq!(navigation_key(&Key::Character("=".into())), Some(NavigationKey::ZoomIn));
        assert_eq!(navigation_key(&Key::Character("+".into())), Some(NavigationKey::ZoomIn));
        assert_eq!(navigation_key(&Key::Character("_".into())), Some(NavigationKey::ZoomOut));
        assert_eq!(navigation_key(&Key::Character("R".into())), Some(NavigationKey::Reset));
        assert_eq!(navigation_key(&Key::Character("w".into())), None);
        assert_eq!(navigation_key(&Key::Named(NamedKey::F5)), None);
    }

    #[test]
    fn test_wheel_delta_sign() {
        // Scrolling towards the user zooms in, like a browser wheel event
        assert_eq!(wheel_delta(&MouseScrollDelta::LineDelta(0.0, 1.0)), -100.0);
        assert_eq!(
            wheel_delta(&MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -12.0))),
            12.0
        );
    }

    #[test]
    fn test_two_finger_center_and_spread() {
        let mut touches = HashMap::new();
        touches.insert(1, Vec2::new(0.0, 0.0));
        assert!(two_finger(&touches).is_none());

        touches.insert(2, Vec2::new(4.0, 0.0));
        let (center, spread) = two_finger(&touches).unwrap();
        assert_eq!(center, Vec2::new(2.0, 0.0));
        assert_eq!(spread, 4.0);
    }
}
