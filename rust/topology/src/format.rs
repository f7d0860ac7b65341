// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Text mesh format.
//!
//! A mesh file is a stream of whitespace separated records:
//!
//! ```text
//! s "skeleton"          skeleton name
//! d 0.5                 depth in [0, 1]
//! p 2                   palette row
//! frame h 4             starts the next frame, optional hold
//! v x y [w bone weight]...
//! f i0 i1 i2 ... [c color [legacy] [opacity]] [n nx ny [nz]]
//! curve v0 v1 ox oy [weight]
//! ```
//!
//! Records may span lines; line numbers are only used for error reporting.
//! Curves refer to vertex pairs and are applied when their frame is
//! finalized, after the edges exist.

use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, digit0, digit1, multispace1, one_of, satisfy},
    combinator::{eof, map, map_res, opt, peek, recognize},
    sequence::{delimited, pair, terminated, tuple},
    IResult,
};

use crate::config::{EngineConfig, COLOR_COUNT, MAX_BONES, MAX_DEPTH, MAX_VERTEX_WEIGHTS, MIN_DEPTH};
use crate::error::{Error, Result};
use crate::frame::{FaceData, FaceVertices, Frame, PendingCurve, VertexData, VertexWeight};
use crate::geometry::{Curve, Vec2, EPSILON};
use crate::mesh::Mesh;

/// Text format token
#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    /// Number without fraction or exponent: 42, -3
    Integer(i64),
    /// Number with fraction or exponent: 0.5, -2., 1e-5
    Float(f32),
    /// Keyword or modifier: v, f, curve
    Ident(&'a str),
    /// Double-quoted string
    Quoted(&'a str),
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Integer(v) => write!(f, "{v}"),
            Token::Float(v) => write!(f, "{v}"),
            Token::Ident(s) => write!(f, "{s}"),
            Token::Quoted(s) => write!(f, "\"{s}\""),
        }
    }
}

fn exponent(input: &str) -> IResult<&str, &str> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

/// Parse float: 1.5, -2., 1e-5, 0.25E+3
fn float(input: &str) -> IResult<&str, Token> {
    map_res(
        recognize(tuple((
            opt(one_of("+-")),
            digit1,
            alt((
                recognize(pair(pair(char('.'), digit0), opt(exponent))),
                exponent,
            )),
        ))),
        |s: &str| s.parse::<f32>().map(Token::Float),
    )(input)
}

/// Parse integer: 42, -42
fn integer(input: &str) -> IResult<&str, Token> {
    map_res(recognize(pair(opt(one_of("+-")), digit1)), |s: &str| {
        s.parse::<i64>().map(Token::Integer)
    })(input)
}

fn identifier(input: &str) -> IResult<&str, Token> {
    map(
        recognize(pair(
            satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
            take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
        )),
        Token::Ident,
    )(input)
}

fn quoted(input: &str) -> IResult<&str, Token> {
    map(
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        Token::Quoted,
    )(input)
}

/// One token, which must end at whitespace or end of input.
fn token(input: &str) -> IResult<&str, Token> {
    terminated(
        alt((
            float, // before integer, the fraction decides
            integer,
            quoted,
            identifier,
        )),
        peek(alt((multispace1, eof))),
    )(input)
}

/// Splits input into tokens tagged with their 1-based line number.
fn tokenize(input: &str) -> Result<Vec<(usize, Token<'_>)>> {
    let mut tokens = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line_number = index + 1;
        let mut rest = line.trim_start();
        while !rest.is_empty() {
            let (next, tok) = token(rest).map_err(|_| {
                let word = rest.split_whitespace().next().unwrap_or(rest);
                Error::parse(line_number, format!("invalid token '{word}'"))
            })?;
            tokens.push((line_number, tok));
            rest = next.trim_start();
        }
    }
    Ok(tokens)
}

/// Record-level reader over the token stream.
struct Loader<'a> {
    tokens: Vec<(usize, Token<'a>)>,
    pos: usize,
    config: EngineConfig,
    frames: Vec<Frame>,
    frame: Frame,
    curves: Vec<PendingCurve>,
    depth: i32,
    palette: u8,
    skeleton: Option<String>,
}

impl<'a> Loader<'a> {
    fn new(input: &'a str, config: EngineConfig) -> Result<Self> {
        Ok(Self {
            tokens: tokenize(input)?,
            pos: 0,
            config,
            frames: Vec::new(),
            frame: Frame::with_config(config),
            curves: Vec::new(),
            depth: MIN_DEPTH,
            palette: 0,
            skeleton: None,
        })
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).map(|&(_, t)| t)
    }

    /// Consumes the next token if it is the identifier `name`.
    fn keyword(&mut self, name: &str) -> bool {
        if self.peek() == Some(Token::Ident(name)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn int(&mut self) -> Option<i64> {
        match self.peek() {
            Some(Token::Integer(v)) => {
                self.pos += 1;
                Some(v)
            }
            _ => None,
        }
    }

    /// Consumes any number.
    fn float(&mut self) -> Option<f32> {
        match self.peek() {
            Some(Token::Integer(v)) => {
                self.pos += 1;
                Some(v as f32)
            }
            Some(Token::Float(v)) => {
                self.pos += 1;
                Some(v)
            }
            _ => None,
        }
    }

    fn expect_int(&mut self, line: usize, what: &str) -> Result<i64> {
        self.int()
            .ok_or_else(|| Error::parse(line, format!("missing {what}")))
    }

    fn expect_float(&mut self, line: usize, what: &str) -> Result<f32> {
        self.float()
            .ok_or_else(|| Error::parse(line, format!("missing {what}")))
    }

    fn run(mut self) -> Result<Mesh> {
        while let Some(&(line, tok)) = self.tokens.get(self.pos) {
            self.pos += 1;
            match tok {
                Token::Ident("v") => self.vertex(line)?,
                Token::Ident("f") => self.face(line)?,
                Token::Ident("curve") => self.curve(line)?,
                Token::Ident("frame") => self.frame_marker(line)?,
                Token::Ident("s") => match self.peek() {
                    Some(Token::Quoted(name)) => {
                        self.pos += 1;
                        self.skeleton = Some(name.to_string());
                    }
                    _ => return Err(Error::parse(line, "missing skeleton name")),
                },
                Token::Ident("d") => {
                    let depth = self.expect_float(line, "mesh depth")?;
                    let scaled = if depth <= 1.0 {
                        depth * (MAX_DEPTH - MIN_DEPTH) as f32 + MIN_DEPTH as f32
                    } else {
                        depth
                    };
                    self.depth = (scaled.round() as i32).clamp(MIN_DEPTH, MAX_DEPTH);
                }
                Token::Ident("p") => {
                    let palette = self.expect_int(line, "palette")?;
                    self.palette = u8::try_from(palette)
                        .map_err(|_| Error::parse(line, format!("palette {palette} out of range")))?;
                }
                Token::Ident("e") => {
                    // legacy edge color
                    self.expect_int(line, "edge color x")?;
                    self.expect_int(line, "edge color y")?;
                }
                other => return Err(Error::parse(line, format!("invalid token '{other}' in mesh"))),
            }
        }

        // a trailing frame marker with nothing after it adds no frame
        let last = std::mem::take(&mut self.frame);
        if last.vertex_count() > 0 || self.frames.is_empty() {
            self.finish_frame(last);
        }

        let mut mesh = Mesh::from_frames(self.config, self.frames);
        mesh.depth = self.depth;
        mesh.palette = self.palette;
        mesh.skeleton = self.skeleton;
        tracing::debug!(
            frames = mesh.frame_count(),
            vertices = mesh.current_frame().vertex_count(),
            faces = mesh.current_frame().face_count(),
            "loaded mesh"
        );
        Ok(mesh)
    }

    fn vertex(&mut self, line: usize) -> Result<()> {
        self.frame
            .ensure_vertex_capacity(1)
            .map_err(|e| Error::parse(line, e.to_string()))?;
        let x = self.expect_float(line, "vertex x coordinate")?;
        let y = self.expect_float(line, "vertex y coordinate")?;
        let mut vertex = VertexData::new(Vec2::new(x, y));

        let mut slot = 0;
        loop {
            if self.keyword("e") || self.keyword("h") {
                // deprecated per-vertex values
                self.float();
            } else if self.keyword("w") {
                let bone = self.expect_int(line, "weight bone index")?;
                let weight = self.expect_float(line, "weight value")?;
                let bone = u8::try_from(bone)
                    .ok()
                    .filter(|&b| usize::from(b) < MAX_BONES)
                    .ok_or_else(|| Error::parse(line, format!("bone index {bone} out of range")))?;
                if slot < MAX_VERTEX_WEIGHTS && weight > EPSILON {
                    vertex.weights[slot] = VertexWeight {
                        bone,
                        weight: weight.min(1.0),
                    };
                    slot += 1;
                }
            } else {
                break;
            }
        }

        self.frame.vertices.push(vertex);
        Ok(())
    }

    fn face(&mut self, line: usize) -> Result<()> {
        let vertex_count = self.frame.vertex_count();
        let mut vertices = FaceVertices::new();
        while let Some(index) = self.int() {
            let v = usize::try_from(index)
                .ok()
                .filter(|&v| v < vertex_count)
                .ok_or_else(|| Error::parse(line, format!("face vertex index {index} out of range")))?;
            vertices.push(v);
        }
        // closed cycles repeat the first index
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }

        let mut face = FaceData::new(vertices, 0);
        loop {
            if self.keyword("c") {
                let color = self.expect_int(line, "face color")?;
                face.color = u8::try_from(color)
                    .ok()
                    .filter(|&c| usize::from(c) < COLOR_COUNT)
                    .ok_or_else(|| Error::parse(line, format!("face color {color} out of range")))?;
                // legacy second color component
                self.int();
                if let Some(opacity) = self.float() {
                    face.opacity = opacity.clamp(0.0, 1.0);
                }
            } else if self.keyword("n") {
                let nx = self.expect_float(line, "face normal x")?;
                let ny = self.expect_float(line, "face normal y")?;
                // legacy z component
                self.float();
                face.normal = Vec2::new(nx, ny);
            } else {
                break;
            }
        }

        self.frame
            .push_face(face)
            .map_err(|e| Error::parse(line, e.to_string()))?;
        Ok(())
    }

    fn curve(&mut self, line: usize) -> Result<()> {
        let v0 = self.expect_int(line, "curve v0")?;
        let v1 = self.expect_int(line, "curve v1")?;
        let ox = self.expect_float(line, "curve offset x")?;
        let oy = self.expect_float(line, "curve offset y")?;
        let weight = self.float().unwrap_or(1.0);

        let (Ok(v0), Ok(v1)) = (usize::try_from(v0), usize::try_from(v1)) else {
            return Err(Error::parse(line, format!("curve vertex pair {v0} {v1} out of range")));
        };
        self.curves.push(PendingCurve {
            v0,
            v1,
            curve: Curve::new(Vec2::new(ox, oy), weight),
        });
        Ok(())
    }

    fn frame_marker(&mut self, line: usize) -> Result<()> {
        if self.frame.vertex_count() > 0 {
            if self.frames.len() + 1 >= self.config.max_frames {
                return Err(Error::parse(
                    line,
                    format!("too many frames (max {})", self.config.max_frames),
                ));
            }
            let done = std::mem::replace(&mut self.frame, Frame::with_config(self.config));
            self.finish_frame(done);
        }

        if self.keyword("h") || self.keyword("hold") {
            let hold = self.expect_int(line, "frame hold")?;
            self.frame.hold = u32::try_from(hold)
                .map_err(|_| Error::parse(line, format!("frame hold {hold} out of range")))?;
        }
        Ok(())
    }

    /// Builds edges, applies the frame's curves and stores it.
    fn finish_frame(&mut self, mut frame: Frame) {
        for pending in self.curves.drain(..) {
            frame.queue_curve(pending.v0, pending.v1, pending.curve);
        }
        frame.rebuild_adjacency();
        self.frames.push(frame);
    }
}

impl Mesh {
    /// Parses a mesh from the text format with default capacities.
    ///
    /// ```
    /// use vecmesh_topology::Mesh;
    ///
    /// let mesh = Mesh::from_text("v 0 0\nv 1 0\nv 0 1\nf 0 1 2 c 3\n").unwrap();
    /// assert_eq!(mesh.current_frame().face_count(), 1);
    /// ```
    pub fn from_text(input: &str) -> Result<Self> {
        Self::from_text_with_config(input, EngineConfig::default())
    }

    pub fn from_text_with_config(input: &str, config: EngineConfig) -> Result<Self> {
        Loader::new(input, config)?.run()
    }

    /// Writes the mesh in the text format.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.skeleton {
            writeln!(f, "s \"{name}\"")?;
        }
        let depth = (self.depth - MIN_DEPTH) as f32 / (MAX_DEPTH - MIN_DEPTH) as f32;
        writeln!(f, "d {depth:?}")?;
        writeln!(f, "p {}", self.palette)?;
        writeln!(f)?;

        let count = self.frames.len();
        for (index, frame) in self.frames.iter().enumerate() {
            if count > 1 || frame.hold > 0 {
                write!(f, "frame")?;
                if frame.hold > 0 {
                    write!(f, " h {}", frame.hold)?;
                }
                writeln!(f)?;
            }
            write_frame(f, frame)?;
            if index + 1 < count {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Floats are written with `{:?}` so they always carry a fraction or
/// exponent and read back as floats.
fn write_frame(f: &mut fmt::Formatter<'_>, frame: &Frame) -> fmt::Result {
    for vertex in frame.vertices() {
        write!(f, "v {:?} {:?}", vertex.position.x, vertex.position.y)?;
        for w in vertex.weights.iter().filter(|w| w.weight > EPSILON) {
            write!(f, " w {} {:?}", w.bone, w.weight)?;
        }
        writeln!(f)?;
    }
    writeln!(f)?;

    for face in frame.faces() {
        write!(f, "f")?;
        for v in &face.vertices {
            write!(f, " {v}")?;
        }
        write!(f, " c {}", face.color)?;
        if face.opacity < 1.0 {
            write!(f, " {:?}", face.opacity)?;
        }
        if face.normal.norm_squared() > 0.0001 {
            write!(f, " n {:?} {:?}", face.normal.x, face.normal.y)?;
        }
        writeln!(f)?;
    }

    for edge in frame.edges().iter().filter(|e| e.curve.is_curved()) {
        writeln!(
            f,
            "curve {} {} {:?} {:?} {:?}",
            edge.v0, edge.v1, edge.curve.offset.x, edge.curve.offset.y, edge.curve.weight
        )?;
    }
    Ok(())
}
