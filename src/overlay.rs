//! Rigid 2-D overlay ("addon") placement.
//!
//! Addons are sticker images (glasses, moustaches, hats) drawn onto a frame
//! at a pose derived from the facial landmarks: rolled with the eye line,
//! squeezed horizontally with the yaw estimate, and anchored per kind.

use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::geom::{Affine, Point};
use crate::image::{Image, Rect};
use crate::landmark::{LandmarkIdx, Landmarks};

/// Horizontal squeeze per radian of yaw, approximating perspective.
const YAW_SQUEEZE: f32 = 0.3;

/// Landmarks the pose estimate requires.
const POSE_ANCHORS: [LandmarkIdx; 5] = [
    LandmarkIdx::LeftEyeOuterCorner,
    LandmarkIdx::RightEyeOuterCorner,
    LandmarkIdx::NoseTip,
    LandmarkIdx::LeftCheek,
    LandmarkIdx::RightCheek,
];

/// The supported addon kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddonKind {
    Glasses,
    Moustache,
    Hat,
    Generic,
}

/// Head pose estimated from the landmark configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadPose {
    /// In-plane rotation of the eye line, in radians.
    pub roll: f32,
    /// Left/right head turn in radians, estimated from the cheek distances.
    pub yaw: f32,
}

/// Estimates head pose from the eye corners, nose tip and cheeks.
///
/// Returns `None` when any required landmark is absent.
pub fn head_pose(landmarks: &Landmarks) -> Option<HeadPose> {
    let left_eye = landmarks.named(LandmarkIdx::LeftEyeOuterCorner)?;
    let right_eye = landmarks.named(LandmarkIdx::RightEyeOuterCorner)?;
    let nose = landmarks.named(LandmarkIdx::NoseTip)?;
    let left_cheek = landmarks.named(LandmarkIdx::LeftCheek)?;
    let right_cheek = landmarks.named(LandmarkIdx::RightCheek)?;

    let eye_line = Vector2::new(right_eye.x - left_eye.x, right_eye.y - left_eye.y);
    let roll = Rotation2::rotation_between(&Vector2::x(), &eye_line).angle();

    let dl = nose.distance(left_cheek);
    let dr = nose.distance(right_cheek);
    let yaw = if dl + dr > 0.0 {
        (dl - dr) / (dl + dr) * std::f32::consts::FRAC_PI_2
    } else {
        0.0
    };

    Some(HeadPose { roll, yaw })
}

/// Draws `overlay` onto `dst` at the pose and anchors of `kind`.
///
/// Fails with [`Error::OverlayAnchorMissing`] (without touching `dst`) when
/// a required anchor landmark is absent.
pub fn place_overlay(
    dst: &mut Image,
    overlay: &Image,
    kind: AddonKind,
    landmarks: &Landmarks,
) -> crate::Result<()> {
    for idx in POSE_ANCHORS {
        anchor(landmarks, idx)?;
    }
    let pose = head_pose(landmarks).ok_or(Error::OverlayAnchorMissing {
        index: LandmarkIdx::NoseTip as usize,
    })?;

    let aspect = overlay.height() as f32 / overlay.width() as f32;
    let (center, width, flip_y) = match kind {
        AddonKind::Glasses | AddonKind::Generic => {
            let l = anchor(landmarks, LandmarkIdx::LeftEyeOuterCorner)?;
            let r = anchor(landmarks, LandmarkIdx::RightEyeOuterCorner)?;
            let width = 2.2 * l.distance(r);
            (l.midpoint(r), width, kind == AddonKind::Glasses)
        }
        AddonKind::Moustache => {
            let l = anchor(landmarks, LandmarkIdx::MouthCornerLeft)?;
            let r = anchor(landmarks, LandmarkIdx::MouthCornerRight)?;
            let width = 1.8 * l.distance(r);
            let mut center = l.midpoint(r);
            center.y -= 0.3 * width * aspect;
            (center, width, true)
        }
        AddonKind::Hat => {
            let forehead = anchor(landmarks, LandmarkIdx::ForeheadTop)?;
            let l = anchor(landmarks, LandmarkIdx::LeftCheek)?;
            let r = anchor(landmarks, LandmarkIdx::RightCheek)?;
            let width = 1.8 * l.distance(r);
            let center = Point::new((l.x + r.x) / 2.0, forehead.y - 0.2 * width * aspect);
            (center, width, true)
        }
    };
    let height = width * aspect;

    let ow = overlay.width() as f32;
    let oh = overlay.height() as f32;
    // Outermost to innermost: translate to the anchor, roll, squeeze X by the
    // yaw estimate, flip Y for the kinds stored inverted, fit the overlay's
    // pixel size, draw centered.
    let transform = Affine::translation(center.x, center.y)
        .compose(&Affine::rotation(pose.roll))
        .compose(&Affine::scale(1.0 - YAW_SQUEEZE * pose.yaw.abs(), 1.0))
        .compose(&Affine::scale(1.0, if flip_y { -1.0 } else { 1.0 }))
        .compose(&Affine::scale(width / ow, height / oh))
        .compose(&Affine::translation(-ow / 2.0, -oh / 2.0));

    let inverse = match transform.invert() {
        Some(m) => m,
        None => return Ok(()),
    };

    let corners = [
        Point::new(0.0, 0.0),
        Point::new(ow, 0.0),
        Point::new(0.0, oh),
        Point::new(ow, oh),
    ]
    .map(|p| transform.apply(p));
    let bounds = Rect::from_top_left(0, 0, dst.width(), dst.height());
    let bbox = Rect::bounding(
        corners
            .iter()
            .flat_map(|p| [(p.x.floor() as i32, p.y.floor() as i32), (p.x.ceil() as i32, p.y.ceil() as i32)]),
    )
    .and_then(|b| b.intersection(&bounds));
    let bbox = match bbox {
        Some(b) => b,
        None => return Ok(()),
    };

    log::trace!(
        "overlay {:?} at ({:.1}, {:.1}), {}x{:.0}, roll {:.2} yaw {:.2}",
        kind,
        center.x,
        center.y,
        width,
        height,
        pose.roll,
        pose.yaw
    );

    for y in bbox.y()..=bbox.y_max() {
        for x in bbox.x()..=bbox.x_max() {
            let s = inverse.apply(Point::new(x as f32, y as f32));
            if s.x < 0.0 || s.x >= ow - 1.0 || s.y < 0.0 || s.y >= oh - 1.0 {
                continue;
            }
            let sample = overlay.sample_bilinear(s.x, s.y);
            let a = sample[3] / 255.0;
            if a <= 0.0 {
                continue;
            }

            let o = 4 * (y as usize * dst.width() as usize + x as usize);
            let data = dst.data_mut();
            for ch in 0..3 {
                let d = data[o + ch] as f32;
                data[o + ch] = (d * (1.0 - a) + sample[ch] * a).round() as u8;
            }
        }
    }

    Ok(())
}

fn anchor(landmarks: &Landmarks, idx: LandmarkIdx) -> crate::Result<Point> {
    landmarks.named(idx).ok_or(Error::OverlayAnchorMissing {
        index: idx as usize,
    })
}
