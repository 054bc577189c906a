use anyhow::Result;

use super::{PoseObservation, PoseSource};
use crate::landmarks::{ImageSize, LandmarkFrame, PixelLandmarks};

/// Decoded image handed to a pose extractor.
pub struct Frame {
    pub index: usize,
    pub size: ImageSize,
    /// Packed RGB24 pixels.
    pub pixels: Vec<u8>,
}

/// Camera, image folder or video reader.
pub trait FrameSource {
    fn name(&self) -> &str;

    /// Next frame in capture order, `None` once exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// External pose estimation model.
///
/// Implementations return normalized coordinates for the eleven body points,
/// with `(0, 0)` for a point they could not place, or `None` when no body is
/// in view.
pub trait PoseExtractor {
    fn name(&self) -> &'static str;

    fn get_landmarks(&mut self, frame: &Frame) -> Result<Option<LandmarkFrame>>;

    /// Convert extractor output to pixel space for the given frame size.
    fn de_normalize(&self, landmarks: &LandmarkFrame, size: ImageSize) -> PixelLandmarks {
        landmarks.de_normalize(size)
    }
}

/// Runs an extractor over every frame of a frame source.
pub struct ExtractingSource<S, E> {
    frames: S,
    extractor: E,
}

impl<S: FrameSource, E: PoseExtractor> ExtractingSource<S, E> {
    pub fn new(frames: S, extractor: E) -> Self {
        Self { frames, extractor }
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }
}

impl<S: FrameSource, E: PoseExtractor> PoseSource for ExtractingSource<S, E> {
    fn name(&self) -> &str {
        self.frames.name()
    }

    fn next_observation(&mut self) -> Result<Option<PoseObservation>> {
        let Some(frame) = self.frames.next_frame()? else {
            return Ok(None);
        };
        let landmarks = self.extractor.get_landmarks(&frame)?;
        Ok(Some(PoseObservation {
            index: frame.index,
            size: frame.size,
            landmarks,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Point;

    struct CountingFrames {
        remaining: usize,
        next: usize,
    }

    impl FrameSource for CountingFrames {
        fn name(&self) -> &str {
            "counting"
        }

        fn next_frame(&mut self) -> Result<Option<Frame>> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            let index = self.next;
            self.next += 1;
            Ok(Some(Frame {
                index,
                size: ImageSize::new(4, 4),
                pixels: vec![index as u8; 4 * 4 * 3],
            }))
        }
    }

    /// Sees a body only in even frames.
    struct EvenFrameExtractor;

    impl PoseExtractor for EvenFrameExtractor {
        fn name(&self) -> &'static str {
            "even"
        }

        fn get_landmarks(&mut self, frame: &Frame) -> Result<Option<LandmarkFrame>> {
            if frame.pixels[0] % 2 == 1 {
                return Ok(None);
            }
            Ok(Some(LandmarkFrame {
                front_face: Point::new(0.5, 0.25),
                ..LandmarkFrame::default()
            }))
        }
    }

    #[test]
    fn extractor_runs_on_every_frame_in_order() -> Result<()> {
        let mut source = ExtractingSource::new(
            CountingFrames {
                remaining: 3,
                next: 0,
            },
            EvenFrameExtractor,
        );
        assert_eq!(source.name(), "counting");

        let mut seen = Vec::new();
        while let Some(obs) = source.next_observation()? {
            seen.push((obs.index, obs.landmarks.is_some()));
        }
        assert_eq!(seen, vec![(0, true), (1, false), (2, true)]);

        let pixels = source
            .extractor()
            .de_normalize(&LandmarkFrame::default(), ImageSize::new(4, 4));
        assert_eq!(pixels, LandmarkFrame::default().de_normalize(ImageSize::new(4, 4)));
        Ok(())
    }
}
