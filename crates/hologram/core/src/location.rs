//! World locations and their string encoding.
use std::fmt;

/// Point in world space, in blocks.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ORIGIN: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns this position shifted down by `distance` blocks.
    pub fn below(self, distance: f64) -> Self {
        Self {
            y: self.y - distance,
            ..self
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Position inside a named world, with a facing direction.
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    pub world: String,
    pub position: Position,
    pub yaw: f32,
    pub pitch: f32,
}

impl Location {
    pub fn new(world: impl Into<String>, position: Position) -> Self {
        Self {
            world: world.into(),
            position,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    pub fn with_rotation(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self
    }

    /// Same world and facing, position moved down by `distance`.
    pub fn below(&self, distance: f64) -> Self {
        Self {
            position: self.position.below(distance),
            ..self.clone()
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.world, self.position)
    }
}

/// Reasons a stored location string cannot be turned back into a [`Location`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("location string is empty")]
    Empty,

    #[error("location has no world name")]
    MissingWorld,

    #[error("expected 4 or 6 comma-separated fields, found {0}")]
    FieldCount(usize),

    #[error("field `{field}` is not a finite number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

/// Converts locations to and from their persisted string form.
pub trait LocationCodec: Send + Sync {
    fn encode(&self, location: &Location) -> String;

    fn decode(&self, encoded: &str) -> Result<Location, LocationError>;
}

/// `world,x,y,z,yaw,pitch` encoding.
///
/// Yaw and pitch may be omitted when decoding and default to zero. `%` and `,`
/// in the world name are written as `%25` and `%2C`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CsvLocationCodec;

impl CsvLocationCodec {
    fn number<T>(field: &'static str, raw: &str) -> Result<T, LocationError>
    where
        T: std::str::FromStr + Into<f64> + Copy,
    {
        let value: T = raw
            .trim()
            .parse()
            .map_err(|_| LocationError::InvalidNumber {
                field,
                value: raw.to_string(),
            })?;
        if !value.into().is_finite() {
            return Err(LocationError::InvalidNumber {
                field,
                value: raw.to_string(),
            });
        }
        Ok(value)
    }
}

impl LocationCodec for CsvLocationCodec {
    fn encode(&self, location: &Location) -> String {
        let Position { x, y, z } = location.position;
        format!(
            "{},{},{},{},{},{}",
            escape_world(&location.world),
            x,
            y,
            z,
            location.yaw,
            location.pitch
        )
    }

    fn decode(&self, encoded: &str) -> Result<Location, LocationError> {
        if encoded.trim().is_empty() {
            return Err(LocationError::Empty);
        }

        let fields: Vec<&str> = encoded.split(',').collect();
        if fields.len() != 4 && fields.len() != 6 {
            return Err(LocationError::FieldCount(fields.len()));
        }

        let world = fields[0].trim();
        if world.is_empty() {
            return Err(LocationError::MissingWorld);
        }

        let position = Position::new(
            Self::number::<f64>("x", fields[1])?,
            Self::number::<f64>("y", fields[2])?,
            Self::number::<f64>("z", fields[3])?,
        );

        let mut location = Location::new(unescape_world(world), position);
        if fields.len() == 6 {
            location = location.with_rotation(
                Self::number::<f32>("yaw", fields[4])?,
                Self::number::<f32>("pitch", fields[5])?,
            );
        }

        Ok(location)
    }
}

fn escape_world(world: &str) -> String {
    world.replace('%', "%25").replace(',', "%2C")
}

fn unescape_world(world: &str) -> String {
    world.replace("%2C", ",").replace("%25", "%")
}
