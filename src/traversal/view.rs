//! What the operator sees after each action.

use std::fmt;
use std::path::PathBuf;

use crate::progress::ProgressReport;
use crate::record::ImageRecord;

/// Message shown once every image has been passed.
pub const OUT_OF_IMAGES_MESSAGE: &str = "All images annotated!";

/// Result of displaying the current position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum View {
    Image(Box<Frame>),
    /// The position is past the end of the image list. This is the terminal
    /// success state of the workflow, not a failure.
    OutOfImages,
}

impl View {
    pub fn is_out_of_images(&self) -> bool {
        matches!(self, View::OutOfImages)
    }

    pub fn frame(&self) -> Option<&Frame> {
        match self {
            View::Image(frame) => Some(frame.as_ref()),
            View::OutOfImages => None,
        }
    }
}

/// Everything needed to present one image to the operator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Position in the ordered image list.
    pub index: usize,
    /// Number of images in the list when the frame was built.
    pub image_count: usize,
    pub image_name: String,
    pub image_path: PathBuf,
    pub record: ImageRecord,
    pub progress: ProgressReport,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Image(frame) => write!(f, "{frame}"),
            View::OutOfImages => writeln!(f, "{OUT_OF_IMAGES_MESSAGE}"),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "[{}/{}] {} ({})",
            self.index + 1,
            self.image_count,
            self.image_name,
            self.image_path.display()
        )?;

        let boxes: Vec<String> = self.record.boxes().map(ToString::to_string).collect();
        if boxes.is_empty() {
            writeln!(f, "  boxes: none")?;
        } else {
            writeln!(f, "  boxes: {}", boxes.join(" "))?;
        }

        let plate_texts: Vec<&str> = self.record.plate_texts().collect();
        if !plate_texts.is_empty() {
            let quoted: Vec<String> = plate_texts.iter().map(|text| format!("{text:?}")).collect();
            writeln!(f, "  plate text: {}", quoted.join(", "))?;
        }
        if self.record.is_flagged() {
            writeln!(f, "  flagged")?;
        }

        write!(f, "{}", self.progress)
    }
}
