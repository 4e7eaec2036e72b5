//! View transform of the image preview overlay: zoom, rotation and panning.

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 5.0;
pub const ZOOM_STEP: f64 = 1.25;

/// What a key press asks the overlay to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewCommand {
    Close,
    ZoomIn,
    ZoomOut,
    RotateRight,
    RotateLeft,
    Reset,
}

impl PreviewCommand {
    pub fn from_key(key: &str) -> Option<PreviewCommand> {
        match key {
            "Escape" => Some(PreviewCommand::Close),
            "+" | "=" => Some(PreviewCommand::ZoomIn),
            "-" => Some(PreviewCommand::ZoomOut),
            "r" => Some(PreviewCommand::RotateRight),
            "l" => Some(PreviewCommand::RotateLeft),
            "0" => Some(PreviewCommand::Reset),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f64,
    /// Clockwise degrees, always one of 0, 90, 180 or 270.
    pub rotation: u16,
    pub offset: (f64, f64),
    /// Pointer position minus offset at drag start, while a drag is active.
    drag_origin: Option<(f64, f64)>,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation: 0,
            offset: (0.0, 0.0),
            drag_origin: None,
        }
    }
}

impl ViewTransform {
    pub fn zoom_in(&mut self) {
        self.scale = (self.scale * ZOOM_STEP).min(MAX_SCALE);
    }

    pub fn zoom_out(&mut self) {
        self.scale = (self.scale / ZOOM_STEP).max(MIN_SCALE);
    }

    pub fn rotate_right(&mut self) {
        self.rotation = (self.rotation + 90) % 360;
    }

    pub fn rotate_left(&mut self) {
        self.rotation = (self.rotation + 270) % 360;
    }

    pub fn reset(&mut self) {
        *self = ViewTransform::default();
    }

    /// Scrolling up zooms in, anything else zooms out.
    pub fn wheel(&mut self, delta_y: f64) {
        if delta_y < 0.0 {
            self.zoom_in();
        } else {
            self.zoom_out();
        }
    }

    pub fn begin_drag(&mut self, x: f64, y: f64) {
        self.drag_origin = Some((x - self.offset.0, y - self.offset.1));
    }

    /// Follow the pointer; ignored when no drag is active.
    pub fn drag_to(&mut self, x: f64, y: f64) {
        if let Some((ox, oy)) = self.drag_origin {
            self.offset = (x - ox, y - oy);
        }
    }

    pub fn end_drag(&mut self) {
        self.drag_origin = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_origin.is_some()
    }

    /// Apply a key binding. Returns `true` when the key asks to close the
    /// overlay; unknown keys change nothing.
    pub fn apply_key(&mut self, key: &str) -> bool {
        match PreviewCommand::from_key(key) {
            Some(command) => self.apply(command),
            None => false,
        }
    }

    pub fn apply(&mut self, command: PreviewCommand) -> bool {
        match command {
            PreviewCommand::Close => return true,
            PreviewCommand::ZoomIn => self.zoom_in(),
            PreviewCommand::ZoomOut => self.zoom_out(),
            PreviewCommand::RotateRight => self.rotate_right(),
            PreviewCommand::RotateLeft => self.rotate_left(),
            PreviewCommand::Reset => self.reset(),
        }
        false
    }

    pub fn zoom_percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }

    /// CSS `transform` value: translate, then scale, then rotate.
    pub fn css_transform(&self) -> String {
        format!(
            "translate({}px, {}px) scale({}) rotate({}deg)",
            self.offset.0, self.offset.1, self.scale, self.rotation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_is_clamped() {
        let mut view = ViewTransform::default();
        for _ in 0..20 {
            view.zoom_in();
        }
        assert_eq!(view.scale, MAX_SCALE);
        for _ in 0..40 {
            view.zoom_out();
        }
        assert_eq!(view.scale, MIN_SCALE);
    }

    #[test]
    fn zoom_steps_by_a_quarter() {
        let mut view = ViewTransform::default();
        view.zoom_in();
        assert_eq!(view.zoom_percent(), 125);
        view.wheel(120.0);
        assert_eq!(view.zoom_percent(), 100);
        view.wheel(-1.0);
        assert_eq!(view.zoom_percent(), 125);
    }

    #[test]
    fn rotation_wraps_both_ways() {
        let mut view = ViewTransform::default();
        view.rotate_left();
        assert_eq!(view.rotation, 270);
        for _ in 0..3 {
            view.rotate_right();
        }
        assert_eq!(view.rotation, 180);
        view.rotate_right();
        view.rotate_right();
        assert_eq!(view.rotation, 0);
    }

    #[test]
    fn drag_moves_offset_only_while_active() {
        let mut view = ViewTransform::default();
        view.drag_to(50.0, 50.0);
        assert_eq!(view.offset, (0.0, 0.0));

        view.begin_drag(10.0, 20.0);
        view.drag_to(40.0, 10.0);
        assert_eq!(view.offset, (30.0, -10.0));
        view.end_drag();
        view.drag_to(500.0, 500.0);
        assert_eq!(view.offset, (30.0, -10.0));

        view.begin_drag(100.0, 100.0);
        view.drag_to(110.0, 100.0);
        assert_eq!(view.offset, (40.0, -10.0));
    }

    #[test]
    fn keys_drive_the_transform() {
        let mut view = ViewTransform::default();
        assert!(!view.apply_key("="));
        assert!(!view.apply_key("r"));
        view.begin_drag(0.0, 0.0);
        view.drag_to(5.0, 5.0);
        assert_eq!(view.css_transform(), "translate(5px, 5px) scale(1.25) rotate(90deg)");

        assert!(!view.apply_key("x"));
        assert!(!view.apply_key("0"));
        assert_eq!(view, ViewTransform::default());
        assert!(view.apply_key("Escape"));
    }
}
