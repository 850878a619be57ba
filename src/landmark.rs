//! Facial landmark sets and the fixed index tables derived from MediaPipe's
//! [Face Mesh] topology.
//!
//! Landmarks are ordered 2-D points in the pixel space of the image they
//! annotate. Entries can be *absent* (the detector failed to produce them, or
//! the serialized form contained `null`); every consumer in this crate
//! tolerates absent entries by skipping them.
//!
//! [Face Mesh]: https://google.github.io/mediapipe/solutions/face_mesh.html

use itertools::Itertools;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::geom::Point;

/// Number of landmarks in a full face set (468 mesh points + 10 iris points).
pub const NUM_LANDMARKS: usize = 478;

/// Minimum number of valid landmarks required by the morph pipeline.
pub const MIN_LANDMARKS: usize = 400;

/// The face contour in walk order, used as the hull polygon of the face mask.
pub const FACE_HULL: [usize; 36] = [
    10, 338, 297, 332, 284, 251, 389, 356, 454, 323, 361, 288, 397, 365, 379, 378, 400, 377, 152,
    148, 176, 149, 150, 136, 172, 58, 132, 93, 234, 127, 162, 21, 54, 103, 67, 109,
];

/// The inner-lip contour in walk order, used for the mouth-interior mask.
pub const INNER_LIP: [usize; 20] = [
    78, 95, 88, 178, 87, 14, 317, 402, 318, 324, 308, 415, 310, 311, 312, 13, 82, 81, 80, 191,
];

const LEFT_EYE: [usize; 16] = [
    33, 7, 163, 144, 145, 153, 154, 155, 133, 246, 161, 160, 159, 158, 157, 173,
];
const RIGHT_EYE: [usize; 16] = [
    263, 249, 390, 373, 374, 380, 381, 382, 362, 466, 388, 387, 386, 385, 384, 398,
];
const LEFT_EYEBROW: [usize; 10] = [70, 63, 105, 66, 107, 55, 65, 52, 53, 46];
const RIGHT_EYEBROW: [usize; 10] = [300, 293, 334, 296, 336, 285, 295, 282, 283, 276];
const OUTER_LIP: [usize; 20] = [
    61, 146, 91, 181, 84, 17, 314, 405, 321, 375, 291, 409, 270, 269, 267, 0, 37, 39, 40, 185,
];
const NOSE: [usize; 14] = [1, 2, 4, 5, 6, 19, 94, 97, 98, 168, 195, 197, 326, 327];
const CHEEKS: [usize; 16] = [
    50, 101, 118, 123, 147, 187, 205, 207, 280, 330, 347, 352, 376, 411, 425, 427,
];
const FOREHEAD: [usize; 11] = [8, 9, 151, 68, 69, 104, 108, 298, 299, 333, 337];
const IRIS: [usize; 10] = [468, 469, 470, 471, 472, 473, 474, 475, 476, 477];

/// The landmark indices used as vertices of the morph mesh: contour, eyes,
/// eyebrows, nose, lips, cheeks, forehead and irises, deduplicated and sorted.
pub static KEY_INDICES: Lazy<Vec<usize>> = Lazy::new(|| {
    [
        &FACE_HULL[..],
        &LEFT_EYE[..],
        &RIGHT_EYE[..],
        &LEFT_EYEBROW[..],
        &RIGHT_EYEBROW[..],
        &OUTER_LIP[..],
        &INNER_LIP[..],
        &NOSE[..],
        &CHEEKS[..],
        &FOREHEAD[..],
        &IRIS[..],
    ]
    .concat()
    .into_iter()
    .sorted()
    .dedup()
    .collect()
});

/// Assigns a name to certain important landmark indices.
///
/// "Left" and "Right" are relative to the input image, not from the PoV of the
/// depicted person.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkIdx {
    NoseTip = 1,
    ForeheadTop = 10,
    MouthTop = 13,
    MouthBottom = 14,
    MouthCornerLeft = 61,
    MouthCornerRight = 291,
    MouthLeft = 78,
    MouthRight = 308,
    LeftEyeOuterCorner = 33,
    LeftEyeInnerCorner = 133,
    RightEyeInnerCorner = 362,
    RightEyeOuterCorner = 263,
    Chin = 152,
    LeftCheek = 234,
    RightCheek = 454,
}

impl From<LandmarkIdx> for usize {
    #[inline]
    fn from(idx: LandmarkIdx) -> usize {
        idx as usize
    }
}

/// An ordered, absent-tolerant set of 2-D facial landmarks.
#[derive(Debug, Clone, PartialEq)]
pub struct Landmarks {
    points: Vec<Option<Point>>,
}

impl Landmarks {
    /// Creates a landmark set from optional points.
    ///
    /// Points with non-finite coordinates are stored as absent.
    pub fn new(points: Vec<Option<Point>>) -> Self {
        Self {
            points: points
                .into_iter()
                .map(|p| p.filter(|p| p.is_finite()))
                .collect(),
        }
    }

    /// Creates a landmark set in which every entry is present.
    pub fn from_points<I: IntoIterator<Item = Point>>(points: I) -> Self {
        Self::new(points.into_iter().map(Some).collect())
    }

    /// Parses the landmark JSON format: a top-level array of `[x, y]` number
    /// pairs in pixel space.
    ///
    /// Entries that are `null`, malformed, or contain non-finite numbers are
    /// treated as absent rather than rejected; only a syntactically invalid
    /// document is an error.
    pub fn from_json_slice(data: &[u8]) -> crate::Result<Self> {
        let entries: Vec<Value> = serde_json::from_slice(data)?;
        Ok(Self::new(entries.iter().map(parse_entry).collect()))
    }

    /// Serializes to a JSON array of `[x, y]` integer pairs, the format
    /// produced by the landmark editor. Absent entries become `null`.
    pub fn to_json_string(&self) -> crate::Result<String> {
        let entries: Vec<Value> = self
            .points
            .iter()
            .map(|p| match p {
                Some(p) => Value::from(vec![
                    Value::from(p.x.round() as i64),
                    Value::from(p.y.round() as i64),
                ]),
                None => Value::Null,
            })
            .collect();
        Ok(serde_json::to_string(&entries)?)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of present entries.
    pub fn valid_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }

    /// Returns the landmark at `index`, or `None` when it is absent or the
    /// index is out of range.
    #[inline]
    pub fn get(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied().flatten()
    }

    /// Returns a named landmark.
    #[inline]
    pub fn named(&self, idx: LandmarkIdx) -> Option<Point> {
        self.get(idx as usize)
    }

    /// Replaces the landmark at `index`, growing the set if needed.
    pub fn set(&mut self, index: usize, point: Point) {
        if index >= self.points.len() {
            self.points.resize(index + 1, None);
        }
        self.points[index] = Some(point).filter(|p| p.is_finite());
    }

    /// Returns a copy with every present point scaled by `(sx, sy)`, mapping
    /// the set into another image's pixel space.
    pub fn scaled(&self, sx: f32, sy: f32) -> Landmarks {
        Landmarks {
            points: self
                .points
                .iter()
                .map(|p| p.map(|p| Point::new(p.x * sx, p.y * sy)))
                .collect(),
        }
    }
}

fn parse_entry(value: &Value) -> Option<Point> {
    let arr = value.as_array()?;
    let x = arr.first()?.as_f64()?;
    let y = arr.get(1)?.as_f64()?;
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    Some(Point::new(x as f32, y as f32))
}
