//! SVG path data reader.
//!
//! Converts a `d` attribute into an [`Outline`] made of cubic Bézier spans:
//! lines become degenerate cubics, quadratics are elevated, and elliptical
//! arcs are approximated by cubics.

use crate::error::{PathDataError, PathDataResult};
use crate::shape::{ControlPoint, Outline, Subpath};
use lyon::geom::{point, vector, Angle, Arc, ArcFlags, QuadraticBezierSegment, SvgArc};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Command(char),
    Number(f64),
}

/// Split path data into commands and numbers.
///
/// Handles compact forms such as `M10-5.5.5` and exponents.
fn tokenize(data: &str) -> PathDataResult<Vec<Token>> {
    let chars: Vec<char> = data.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        match ch {
            'M' | 'm' | 'L' | 'l' | 'H' | 'h' | 'V' | 'v' | 'C' | 'c' | 'S' | 's' | 'Q' | 'q'
            | 'T' | 't' | 'A' | 'a' | 'Z' | 'z' => {
                tokens.push(Token::Command(ch));
                i += 1;
            }
            ' ' | ',' | '\n' | '\r' | '\t' => i += 1,
            '+' | '-' | '.' | '0'..='9' => {
                let start = i;
                i = scan_number(&chars, i);
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| PathDataError::UnexpectedToken {
                        position: start,
                        token: text.clone(),
                    })?;
                tokens.push(Token::Number(value));
            }
            _ => {
                return Err(PathDataError::UnexpectedToken {
                    position: i,
                    token: ch.to_string(),
                })
            }
        }
    }

    Ok(tokens)
}

fn scan_number(chars: &[char], mut i: usize) -> usize {
    if matches!(chars[i], '+' | '-') {
        i += 1;
    }
    let mut seen_dot = false;
    let mut seen_exp = false;
    while i < chars.len() {
        match chars[i] {
            '0'..='9' => i += 1,
            '.' if !seen_dot && !seen_exp => {
                seen_dot = true;
                i += 1;
            }
            'e' | 'E' if !seen_exp => {
                seen_exp = true;
                i += 1;
                if i < chars.len() && matches!(chars[i], '+' | '-') {
                    i += 1;
                }
            }
            _ => break,
        }
    }
    i
}

fn arity(command: char) -> usize {
    match command.to_ascii_uppercase() {
        'Z' => 0,
        'H' | 'V' => 1,
        'M' | 'L' | 'T' => 2,
        'S' | 'Q' => 4,
        'C' => 6,
        _ => 7,
    }
}

/// Pen state while walking the commands.
struct OutlineBuilder {
    subpaths: Vec<Subpath>,
    current: Option<Subpath>,
    pen: ControlPoint,
    subpath_start: ControlPoint,
    last_cubic_ctrl: Option<ControlPoint>,
    last_quad_ctrl: Option<ControlPoint>,
}

impl OutlineBuilder {
    fn new() -> Self {
        Self {
            subpaths: Vec::new(),
            current: None,
            pen: point(0.0, 0.0),
            subpath_start: point(0.0, 0.0),
            last_cubic_ctrl: None,
            last_quad_ctrl: None,
        }
    }

    fn finish_current(&mut self) {
        if let Some(subpath) = self.current.take() {
            self.subpaths.push(subpath);
        }
    }

    fn current(&mut self) -> &mut Subpath {
        let pen = self.pen;
        self.current.get_or_insert_with(|| Subpath::new(pen))
    }

    fn move_to(&mut self, to: ControlPoint) {
        self.finish_current();
        self.current = Some(Subpath::new(to));
        self.pen = to;
        self.subpath_start = to;
    }

    fn line_to(&mut self, to: ControlPoint) {
        self.current().line_to(to);
        self.pen = to;
    }

    fn cubic_to(&mut self, ctrl1: ControlPoint, ctrl2: ControlPoint, to: ControlPoint) {
        self.current().cubic_to(ctrl1, ctrl2, to);
        self.pen = to;
        self.last_cubic_ctrl = Some(ctrl2);
    }

    fn quadratic_to(&mut self, ctrl: ControlPoint, to: ControlPoint) {
        let cubic = QuadraticBezierSegment {
            from: self.pen,
            ctrl,
            to,
        }
        .to_cubic();
        self.current().cubic_to(cubic.ctrl1, cubic.ctrl2, to);
        self.pen = to;
        self.last_quad_ctrl = Some(ctrl);
    }

    fn arc_to(&mut self, radii: (f64, f64), x_rotation: f64, flags: ArcFlags, to: ControlPoint) {
        let svg_arc = SvgArc {
            from: self.pen,
            to,
            radii: vector(radii.0.abs(), radii.1.abs()),
            x_rotation: Angle::degrees(x_rotation),
            flags,
        };
        if svg_arc.is_straight_line() {
            if self.pen != to {
                self.line_to(to);
            }
            return;
        }
        let mut spans = Vec::new();
        Arc::from_svg_arc(&svg_arc).for_each_cubic_bezier(&mut |span| spans.push(*span));
        for span in spans {
            self.current().cubic_to(span.ctrl1, span.ctrl2, span.to);
        }
        self.pen = to;
    }

    fn close(&mut self) {
        let start = self.subpath_start;
        if let Some(mut subpath) = self.current.take() {
            if subpath.end_point() != start {
                subpath.line_to(start);
            }
            subpath.closed = true;
            self.subpaths.push(subpath);
        }
        self.pen = start;
    }

    fn build(mut self) -> Outline {
        self.finish_current();
        Outline::new(self.subpaths)
    }
}

fn reflect(ctrl: Option<ControlPoint>, about: ControlPoint) -> ControlPoint {
    ctrl.map_or(about, |c| point(2.0 * about.x - c.x, 2.0 * about.y - c.y))
}

fn arc_flag(value: f64) -> PathDataResult<bool> {
    if value == 0.0 {
        Ok(false)
    } else if value == 1.0 {
        Ok(true)
    } else {
        Err(PathDataError::InvalidArcFlag(value.to_string()))
    }
}

/// Parse SVG path data into an outline of cubic spans.
pub fn parse_path_data(data: &str) -> PathDataResult<Outline> {
    let tokens = tokenize(data)?;
    let mut builder = OutlineBuilder::new();
    let mut i = 0;

    while i < tokens.len() {
        let command = match tokens[i] {
            Token::Command(c) => c,
            Token::Number(_) => return Err(PathDataError::MissingMoveTo),
        };
        i += 1;

        let mut args = Vec::new();
        while let Some(Token::Number(value)) = tokens.get(i) {
            args.push(*value);
            i += 1;
        }

        let n = arity(command);
        if n == 0 {
            builder.close();
            builder.last_cubic_ctrl = None;
            builder.last_quad_ctrl = None;
            continue;
        }
        if args.is_empty() || args.len() % n != 0 {
            return Err(PathDataError::MissingArguments {
                command,
                expected: n,
            });
        }

        let relative = command.is_ascii_lowercase();
        for (index, chunk) in args.chunks(n).enumerate() {
            let origin = if relative { builder.pen } else { point(0.0, 0.0) };
            let at = |x: f64, y: f64| point(origin.x + x, origin.y + y);
            let upper = command.to_ascii_uppercase();

            let was_cubic = builder.last_cubic_ctrl.take();
            let was_quad = builder.last_quad_ctrl.take();

            match upper {
                'M' if index == 0 => builder.move_to(at(chunk[0], chunk[1])),
                'M' | 'L' => builder.line_to(at(chunk[0], chunk[1])),
                'H' => {
                    let x = if relative { builder.pen.x + chunk[0] } else { chunk[0] };
                    builder.line_to(point(x, builder.pen.y));
                }
                'V' => {
                    let y = if relative { builder.pen.y + chunk[0] } else { chunk[0] };
                    builder.line_to(point(builder.pen.x, y));
                }
                'C' => builder.cubic_to(
                    at(chunk[0], chunk[1]),
                    at(chunk[2], chunk[3]),
                    at(chunk[4], chunk[5]),
                ),
                'S' => {
                    let ctrl1 = reflect(was_cubic, builder.pen);
                    builder.cubic_to(ctrl1, at(chunk[0], chunk[1]), at(chunk[2], chunk[3]));
                }
                'Q' => builder.quadratic_to(at(chunk[0], chunk[1]), at(chunk[2], chunk[3])),
                'T' => {
                    let ctrl = reflect(was_quad, builder.pen);
                    builder.quadratic_to(ctrl, at(chunk[0], chunk[1]));
                }
                _ => {
                    let flags = ArcFlags {
                        large_arc: arc_flag(chunk[3])?,
                        sweep: arc_flag(chunk[4])?,
                    };
                    builder.arc_to((chunk[0], chunk[1]), chunk[2], flags, at(chunk[5], chunk[6]));
                }
            }
        }
    }

    Ok(builder.build())
}
