//! Vector path commands and the output path they draw into.

use crate::error::PathError;
use crate::transform::to_affine;
use glam::{Mat3, Vec2};
use kurbo::{BezPath, PathEl, Point};
use std::str::FromStr;

fn pt(v: Vec2) -> Point {
    Point::new(v.x as f64, v.y as f64)
}

/// A reusable path buffer that remembers its current point, so relative
/// commands and order elevation can be resolved against it.
#[derive(Debug, Clone, Default)]
pub struct KfPath {
    inner: BezPath,
    last: Vec2,
}

impl KfPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.inner.truncate(0);
        self.last = Vec2::ZERO;
    }

    pub fn is_empty(&self) -> bool {
        self.inner.elements().is_empty()
    }

    pub fn last_point(&self) -> Vec2 {
        self.last
    }

    pub fn as_bez_path(&self) -> &BezPath {
        &self.inner
    }

    /// Swaps in derived geometry, such as a trimmed copy of this path.
    pub(crate) fn replace(&mut self, path: BezPath) {
        self.last = match path.elements().last() {
            Some(
                PathEl::MoveTo(p) | PathEl::LineTo(p) | PathEl::QuadTo(_, p) | PathEl::CurveTo(_, _, p),
            ) => Vec2::new(p.x as f32, p.y as f32),
            Some(PathEl::ClosePath) => self.last,
            None => Vec2::ZERO,
        };
        self.inner = path;
    }

    // Drawing without a current contour starts one at the current point.
    fn ensure_contour(&mut self) {
        if self.inner.elements().is_empty() {
            self.inner.move_to(pt(self.last));
        }
    }

    pub fn move_to(&mut self, p: Vec2) {
        self.inner.move_to(pt(p));
        self.last = p;
    }

    pub fn r_move_to(&mut self, d: Vec2) {
        self.move_to(self.last + d);
    }

    pub fn line_to(&mut self, p: Vec2) {
        self.ensure_contour();
        self.inner.line_to(pt(p));
        self.last = p;
    }

    pub fn r_line_to(&mut self, d: Vec2) {
        self.line_to(self.last + d);
    }

    pub fn quad_to(&mut self, c: Vec2, p: Vec2) {
        self.ensure_contour();
        self.inner.quad_to(pt(c), pt(p));
        self.last = p;
    }

    pub fn r_quad_to(&mut self, c: Vec2, p: Vec2) {
        let o = self.last;
        self.quad_to(o + c, o + p);
    }

    pub fn cubic_to(&mut self, c1: Vec2, c2: Vec2, p: Vec2) {
        self.ensure_contour();
        self.inner.curve_to(pt(c1), pt(c2), pt(p));
        self.last = p;
    }

    pub fn r_cubic_to(&mut self, c1: Vec2, c2: Vec2, p: Vec2) {
        let o = self.last;
        self.cubic_to(o + c1, o + c2, o + p);
    }

    /// Maps every point, including the tracked last point, through `m`.
    pub fn transform(&mut self, m: &Mat3) {
        self.inner.apply_affine(to_affine(m));
        self.last = m.transform_point2(self.last);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordMode {
    Absolute,
    Relative,
}

/// Geometric order of a command, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CommandKind {
    MoveTo,
    LineTo,
    QuadTo,
    CubicTo,
}

impl CommandKind {
    pub fn arg_count(self) -> usize {
        match self {
            CommandKind::MoveTo | CommandKind::LineTo => 2,
            CommandKind::QuadTo => 4,
            CommandKind::CubicTo => 6,
        }
    }
}

/// One SVG-style drawing command such as `C1,2,3,4,5,6`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorCommand {
    kind: CommandKind,
    mode: CoordMode,
    args: [f32; 6],
}

impl VectorCommand {
    pub fn new(kind: CommandKind, mode: CoordMode, args: &[f32]) -> Result<Self, PathError> {
        let expected = kind.arg_count();
        if args.len() != expected {
            return Err(PathError::ArgumentCount {
                kind,
                expected,
                found: args.len(),
            });
        }
        let mut packed = [0.0; 6];
        packed[..expected].copy_from_slice(args);
        Ok(Self {
            kind,
            mode,
            args: packed,
        })
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn mode(&self) -> CoordMode {
        self.mode
    }

    pub fn args(&self) -> &[f32] {
        &self.args[..self.kind.arg_count()]
    }

    fn point(&self, i: usize) -> Vec2 {
        Vec2::new(self.args[2 * i], self.args[2 * i + 1])
    }

    /// Emits this command onto `path`.
    pub fn apply(&self, path: &mut KfPath) {
        let (a, b, c) = (self.point(0), self.point(1), self.point(2));
        match (self.kind, self.mode) {
            (CommandKind::MoveTo, CoordMode::Absolute) => path.move_to(a),
            (CommandKind::MoveTo, CoordMode::Relative) => path.r_move_to(a),
            (CommandKind::LineTo, CoordMode::Absolute) => path.line_to(a),
            (CommandKind::LineTo, CoordMode::Relative) => path.r_line_to(a),
            (CommandKind::QuadTo, CoordMode::Absolute) => path.quad_to(a, b),
            (CommandKind::QuadTo, CoordMode::Relative) => path.r_quad_to(a, b),
            (CommandKind::CubicTo, CoordMode::Absolute) => path.cubic_to(a, b, c),
            (CommandKind::CubicTo, CoordMode::Relative) => path.r_cubic_to(a, b, c),
        }
    }

    /// Checks that this command can be interpolated against `other`.
    pub fn check_pair(&self, other: &VectorCommand) -> Result<(), PathError> {
        if self.mode != other.mode {
            return Err(PathError::MismatchedCoordinateMode);
        }
        let moves = (self.kind == CommandKind::MoveTo) as u8 + (other.kind == CommandKind::MoveTo) as u8;
        if moves == 1 {
            return Err(PathError::IncompatibleCommands {
                from: self.kind,
                to: other.kind,
            });
        }
        Ok(())
    }

    /// Raises a line or quadratic to `target` order without changing its
    /// shape. `start` is where the command begins: the path's last point for
    /// absolute commands, the origin for relative ones.
    pub fn elevated(&self, target: CommandKind, start: Vec2) -> VectorCommand {
        if target <= self.kind || self.kind == CommandKind::MoveTo {
            return *self;
        }
        let (c1, c2, end) = match self.kind {
            CommandKind::LineTo => {
                let end = self.point(0);
                match target {
                    CommandKind::QuadTo => (start.lerp(end, 0.5), end, end),
                    _ => (
                        start.lerp(end, 1.0 / 3.0),
                        start.lerp(end, 2.0 / 3.0),
                        end,
                    ),
                }
            }
            // quad -> cubic
            _ => {
                let (q, end) = (self.point(0), self.point(1));
                (
                    start + (q - start) * (2.0 / 3.0),
                    end + (q - end) * (2.0 / 3.0),
                    end,
                )
            }
        };
        let args = match target {
            CommandKind::QuadTo => [c1.x, c1.y, end.x, end.y, 0.0, 0.0],
            _ => [c1.x, c1.y, c2.x, c2.y, end.x, end.y],
        };
        VectorCommand {
            kind: target,
            mode: self.mode,
            args,
        }
    }

    /// Emits the command `t` of the way from `self` to `other` onto `path`,
    /// elevating whichever side is of lower order first.
    pub fn interpolate(
        &self,
        other: &VectorCommand,
        t: f32,
        path: &mut KfPath,
    ) -> Result<(), PathError> {
        self.check_pair(other)?;

        let target = self.kind.max(other.kind);
        let start = match self.mode {
            CoordMode::Absolute => path.last_point(),
            CoordMode::Relative => Vec2::ZERO,
        };
        let from = self.elevated(target, start);
        let to = other.elevated(target, start);

        let mut args = [0.0; 6];
        for (i, arg) in args.iter_mut().enumerate().take(target.arg_count()) {
            // two-term form keeps both endpoints exact
            *arg = from.args[i] * (1.0 - t) + to.args[i] * t;
        }
        VectorCommand {
            kind: target,
            mode: self.mode,
            args,
        }
        .apply(path);
        Ok(())
    }
}

impl FromStr for VectorCommand {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let letter = chars.next().ok_or(PathError::Empty)?;
        let (kind, mode) = match letter {
            'M' => (CommandKind::MoveTo, CoordMode::Absolute),
            'm' => (CommandKind::MoveTo, CoordMode::Relative),
            'L' => (CommandKind::LineTo, CoordMode::Absolute),
            'l' => (CommandKind::LineTo, CoordMode::Relative),
            'Q' => (CommandKind::QuadTo, CoordMode::Absolute),
            'q' => (CommandKind::QuadTo, CoordMode::Relative),
            'C' => (CommandKind::CubicTo, CoordMode::Absolute),
            'c' => (CommandKind::CubicTo, CoordMode::Relative),
            _ => return Err(PathError::UnknownCommand(s.to_string())),
        };

        let rest = chars.as_str().trim();
        let args = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split(',')
                .map(|v| {
                    v.trim().parse::<f32>().map_err(|_| PathError::InvalidNumber {
                        command: s.to_string(),
                        value: v.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?
        };
        VectorCommand::new(kind, mode, &args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::PathEl;

    fn cmd(s: &str) -> VectorCommand {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_commands() {
        let c = cmd("C1,2,3,4,5,6");
        assert_eq!(c.kind(), CommandKind::CubicTo);
        assert_eq!(c.mode(), CoordMode::Absolute);
        assert_eq!(c.args(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let l = cmd("l-1.5, 2e1");
        assert_eq!(l.mode(), CoordMode::Relative);
        assert_eq!(l.args(), &[-1.5, 20.0]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "Z".parse::<VectorCommand>().unwrap_err(),
            PathError::UnknownCommand("Z".into())
        );
        assert_eq!(
            "Q1,2".parse::<VectorCommand>().unwrap_err(),
            PathError::ArgumentCount {
                kind: CommandKind::QuadTo,
                expected: 4,
                found: 2
            }
        );
        assert!(matches!(
            "M1,x".parse::<VectorCommand>(),
            Err(PathError::InvalidNumber { .. })
        ));
        assert_eq!("".parse::<VectorCommand>().unwrap_err(), PathError::Empty);
    }

    #[test]
    fn test_relative_commands_track_last_point() {
        let mut path = KfPath::new();
        cmd("M10,10").apply(&mut path);
        cmd("l5,0").apply(&mut path);
        cmd("q0,5,0,10").apply(&mut path);
        assert_eq!(path.last_point(), Vec2::new(15.0, 20.0));
        let els = path.as_bez_path().elements();
        assert_eq!(els[2], PathEl::QuadTo(Point::new(15.0, 15.0), Point::new(15.0, 20.0)));
    }

    #[test]
    fn test_line_to_without_move_starts_at_origin() {
        let mut path = KfPath::new();
        cmd("L3,4").apply(&mut path);
        let els = path.as_bez_path().elements();
        assert_eq!(els[0], PathEl::MoveTo(Point::ZERO));
        assert_eq!(els[1], PathEl::LineTo(Point::new(3.0, 4.0)));
    }

    #[test]
    fn test_elevated_line_keeps_endpoints() {
        let start = Vec2::new(0.0, 0.0);
        let line = cmd("L30,60");
        let cubic = line.elevated(CommandKind::CubicTo, start);
        assert_eq!(cubic.args(), &[10.0, 20.0, 20.0, 40.0, 30.0, 60.0]);
        let quad = line.elevated(CommandKind::QuadTo, start);
        assert_eq!(quad.args(), &[15.0, 30.0, 30.0, 60.0]);
    }

    #[test]
    fn test_quad_to_cubic_two_thirds_rule() {
        let start = Vec2::new(0.0, 0.0);
        let quad = cmd("Q30,30,60,0");
        let cubic = quad.elevated(CommandKind::CubicTo, start);
        assert_eq!(cubic.args(), &[20.0, 20.0, 40.0, 20.0, 60.0, 0.0]);
    }

    #[test]
    fn test_interpolate_elevated_line_round_trip() {
        let line = cmd("L10,20");
        let curve = cmd("C0,50,50,50,40,0");

        let mut path = KfPath::new();
        cmd("M4,4").apply(&mut path);
        line.interpolate(&curve, 0.0, &mut path).unwrap();
        let els = path.as_bez_path().elements();
        match els[1] {
            PathEl::CurveTo(_, _, p) => assert_eq!(p, Point::new(10.0, 20.0)),
            ref other => panic!("expected cubic, got {other:?}"),
        }
        assert_eq!(path.last_point(), Vec2::new(10.0, 20.0));

        let mut path = KfPath::new();
        cmd("M4,4").apply(&mut path);
        line.interpolate(&curve, 1.0, &mut path).unwrap();
        assert_eq!(
            path.as_bez_path().elements()[1],
            PathEl::CurveTo(Point::new(0.0, 50.0), Point::new(50.0, 50.0), Point::new(40.0, 0.0))
        );
    }

    #[test]
    fn test_interpolate_rejects_mixed_modes() {
        let mut path = KfPath::new();
        let err = cmd("L1,1").interpolate(&cmd("l1,1"), 0.5, &mut path).unwrap_err();
        assert_eq!(err, PathError::MismatchedCoordinateMode);
        let err = cmd("M1,1").interpolate(&cmd("L1,1"), 0.5, &mut path).unwrap_err();
        assert!(matches!(err, PathError::IncompatibleCommands { .. }));
    }

    #[test]
    fn test_transform_maps_last_point() {
        let mut path = KfPath::new();
        cmd("M1,0").apply(&mut path);
        path.transform(&Mat3::from_translation(Vec2::new(5.0, 5.0)));
        assert_eq!(path.last_point(), Vec2::new(6.0, 5.0));
        assert_eq!(path.as_bez_path().elements()[0], PathEl::MoveTo(Point::new(6.0, 5.0)));
    }
}
