// input.rs — 把 winit 事件翻译成查看器输入（鼠标 / 单指触摸 / 滚轮 / 全局松开）

use winit::event::{DeviceEvent, ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};

/// Wheel "lines" are converted to pixels at roughly what browsers report per notch.
pub const PIXELS_PER_LINE: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerInput {
    Press { x: f32, y: f32 },
    Move { x: f32, y: f32 },
    Release,
    /// DOM convention: positive means scroll down / zoom out.
    Wheel { delta_y: f32 },
}

/// Converts winit's scroll delta (positive = away from user) to a DOM-style deltaY.
pub fn wheel_delta_y(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * PIXELS_PER_LINE,
        MouseScrollDelta::PixelDelta(pos) => -(pos.y as f32),
    }
}

/// Tracks fingers on the surface. Only a lone finger drives the view;
/// a second finger ends the gesture and lifting back to one resumes it
/// from where the remaining finger is.
#[derive(Debug, Default, Clone)]
pub struct TouchTracker {
    active: Vec<(u64, f32, f32)>,
}

impl TouchTracker {
    pub fn handle(&mut self, id: u64, phase: TouchPhase, x: f32, y: f32) -> Option<ViewerInput> {
        match phase {
            TouchPhase::Started => {
                self.active.retain(|t| t.0 != id);
                self.active.push((id, x, y));
                match self.active.len() {
                    1 => Some(ViewerInput::Press { x, y }),
                    2 => Some(ViewerInput::Release),
                    _ => None,
                }
            }
            TouchPhase::Moved => {
                let touch = self.active.iter_mut().find(|t| t.0 == id)?;
                touch.1 = x;
                touch.2 = y;
                (self.active.len() == 1).then_some(ViewerInput::Move { x, y })
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                let before = self.active.len();
                self.active.retain(|t| t.0 != id);
                if self.active.len() == before {
                    return None;
                }
                match self.active.as_slice() {
                    [] => Some(ViewerInput::Release),
                    [(_, x, y)] => Some(ViewerInput::Press { x: *x, y: *y }),
                    _ => None,
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}

/// Per-window input state: last cursor position and active touches.
#[derive(Debug, Default)]
pub struct InputRouter {
    cursor: Option<(f32, f32)>,
    touches: TouchTracker,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window_event(&mut self, event: &WindowEvent<'_>) -> Option<ViewerInput> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as f32, position.y as f32);
                self.cursor = Some((x, y));
                Some(ViewerInput::Move { x, y })
            }
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed if *button == MouseButton::Left => {
                    let (x, y) = self.cursor?;
                    Some(ViewerInput::Press { x, y })
                }
                ElementState::Pressed => None,
                // 任意按键松开都结束拖拽
                ElementState::Released => Some(ViewerInput::Release),
            },
            WindowEvent::MouseWheel { delta, .. } => Some(ViewerInput::Wheel {
                delta_y: wheel_delta_y(*delta),
            }),
            WindowEvent::Touch(touch) => self.touches.handle(
                touch.id,
                touch.phase,
                touch.location.x as f32,
                touch.location.y as f32,
            ),
            WindowEvent::Focused(false) => {
                self.touches.clear();
                Some(ViewerInput::Release)
            }
            _ => None,
        }
    }

    /// Device-wide events arrive even when the cursor is outside the window,
    /// so a drag released out there still ends.
    pub fn device_event(&mut self, event: &DeviceEvent) -> Option<ViewerInput> {
        match event {
            DeviceEvent::Button {
                state: ElementState::Released,
                ..
            } => Some(ViewerInput::Release),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.cursor = None;
        self.touches.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn wheel_sign_follows_dom() {
        // 向下滚一格 => 正的 deltaY（放大视场角）
        assert_eq!(wheel_delta_y(MouseScrollDelta::LineDelta(0.0, -1.0)), 100.0);
        assert_eq!(wheel_delta_y(MouseScrollDelta::LineDelta(0.0, 2.0)), -200.0);
        assert_eq!(
            wheel_delta_y(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 35.0))),
            -35.0
        );
    }

    #[test]
    fn single_finger_drag() {
        let mut t = TouchTracker::default();
        assert_eq!(
            t.handle(7, TouchPhase::Started, 10.0, 20.0),
            Some(ViewerInput::Press { x: 10.0, y: 20.0 })
        );
        assert_eq!(
            t.handle(7, TouchPhase::Moved, 15.0, 25.0),
            Some(ViewerInput::Move { x: 15.0, y: 25.0 })
        );
        assert_eq!(t.handle(7, TouchPhase::Ended, 15.0, 25.0), Some(ViewerInput::Release));
        assert_eq!(t.handle(7, TouchPhase::Moved, 20.0, 30.0), None);
    }

    #[test]
    fn second_finger_suspends_rotation() {
        let mut t = TouchTracker::default();
        t.handle(1, TouchPhase::Started, 0.0, 0.0);
        assert_eq!(t.handle(2, TouchPhase::Started, 50.0, 50.0), Some(ViewerInput::Release));

        assert_eq!(t.handle(1, TouchPhase::Moved, 30.0, 0.0), None);
        assert_eq!(t.handle(2, TouchPhase::Moved, 80.0, 50.0), None);

        // 抬起一指后，从剩下那根手指的位置继续
        assert_eq!(
            t.handle(2, TouchPhase::Ended, 80.0, 50.0),
            Some(ViewerInput::Press { x: 30.0, y: 0.0 })
        );
        assert_eq!(
            t.handle(1, TouchPhase::Moved, 40.0, 0.0),
            Some(ViewerInput::Move { x: 40.0, y: 0.0 })
        );
    }

    #[test]
    fn unknown_touch_ids_are_ignored() {
        let mut t = TouchTracker::default();
        assert_eq!(t.handle(9, TouchPhase::Moved, 1.0, 1.0), None);
        assert_eq!(t.handle(9, TouchPhase::Cancelled, 1.0, 1.0), None);
    }
}
