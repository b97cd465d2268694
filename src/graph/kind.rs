//! Operator kind enumeration.
//!
//! The closed set of built-in operator kinds, plus a `Plugin` tag for
//! host-provided operators. Persistence and canvas code match on this.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorKind {
    // Sources
    ConstantColor,
    ImageSource,
    CameraSource,

    // Combine
    Add,
    Multiply,
    Mix,

    // Filters
    Threshold,
    Dilate,
    Erode,
    Convolve,
    Median,
    BrightnessContrast,
    Invert,
    Grayscale,

    // Coordinate remaps
    Mirror,
    Fisheye,
    Distort,
    NormalMap,

    // Scripted
    Script,

    /// Terminal node. Exactly one per graph.
    Output,

    /// Operator supplied through `OperatorPlugin`.
    Plugin,
}

impl OperatorKind {
    /// Get the display name for this kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            OperatorKind::ConstantColor => "Color",
            OperatorKind::ImageSource => "Image",
            OperatorKind::CameraSource => "Camera",
            OperatorKind::Add => "Add",
            OperatorKind::Multiply => "Multiply",
            OperatorKind::Mix => "Mix",
            OperatorKind::Threshold => "Threshold",
            OperatorKind::Dilate => "Dilate",
            OperatorKind::Erode => "Erode",
            OperatorKind::Convolve => "Convolve",
            OperatorKind::Median => "Median",
            OperatorKind::BrightnessContrast => "Brightness/Contrast",
            OperatorKind::Invert => "Invert",
            OperatorKind::Grayscale => "Grayscale",
            OperatorKind::Mirror => "Mirror",
            OperatorKind::Fisheye => "Fisheye",
            OperatorKind::Distort => "Distort",
            OperatorKind::NormalMap => "Normal Map",
            OperatorKind::Script => "Script",
            OperatorKind::Output => "Output",
            OperatorKind::Plugin => "Plugin",
        }
    }

    /// Every built-in kind a user can create from the canvas menu.
    pub fn all() -> &'static [OperatorKind] {
        &[
            OperatorKind::ConstantColor,
            OperatorKind::ImageSource,
            OperatorKind::CameraSource,
            OperatorKind::Add,
            OperatorKind::Multiply,
            OperatorKind::Mix,
            OperatorKind::Threshold,
            OperatorKind::Dilate,
            OperatorKind::Erode,
            OperatorKind::Convolve,
            OperatorKind::Median,
            OperatorKind::BrightnessContrast,
            OperatorKind::Invert,
            OperatorKind::Grayscale,
            OperatorKind::Mirror,
            OperatorKind::Fisheye,
            OperatorKind::Distort,
            OperatorKind::NormalMap,
            OperatorKind::Script,
        ]
    }

    pub fn is_source(&self) -> bool {
        matches!(
            self,
            OperatorKind::ConstantColor | OperatorKind::ImageSource | OperatorKind::CameraSource
        )
    }

    /// Kinds whose value at a pixel depends on neighbouring input pixels.
    pub fn is_windowed(&self) -> bool {
        matches!(
            self,
            OperatorKind::Threshold
                | OperatorKind::Dilate
                | OperatorKind::Erode
                | OperatorKind::Convolve
                | OperatorKind::Median
                | OperatorKind::NormalMap
        )
    }

    /// Get a short description of what this kind computes.
    pub fn description(&self) -> &'static str {
        match self {
            OperatorKind::ConstantColor => "Fills the image with one color.",
            OperatorKind::ImageSource => "Samples a loaded bitmap at the nearest pixel.",
            OperatorKind::CameraSource => "Samples the latest live camera frame.",
            OperatorKind::Add => "Adds A and B channel by channel, unclamped.",
            OperatorKind::Multiply => "Multiplies A and B channel by channel.",
            OperatorKind::Mix => {
                "Blends A towards B by the Factor input's luma, or by the factor parameter when Factor is unconnected."
            }
            OperatorKind::Threshold => {
                "Black/white by comparing luma with a fixed or locally averaged threshold."
            }
            OperatorKind::Dilate => "Brightest sample (by luma) in a square window.",
            OperatorKind::Erode => "Darkest sample (by luma) in a square window.",
            OperatorKind::Convolve => "Applies a named 3x3 kernel (blur, sharpen, edge, emboss).",
            OperatorKind::Median => "Median sample by luma in a square window.",
            OperatorKind::BrightnessContrast => "value * contrast + brightness, clamped to [0, 1].",
            OperatorKind::Invert => "One minus each color channel.",
            OperatorKind::Grayscale => "Replaces color with its luma.",
            OperatorKind::Mirror => "Folds the image back on itself horizontally, optionally vertically.",
            OperatorKind::Fisheye => "Raises the polar radius to a power inside the unit disc.",
            OperatorKind::Distort => "Offsets lookup coordinates by a second image's red/green.",
            OperatorKind::NormalMap => "Reconstructs a normal map from luma gradients.",
            OperatorKind::Script => "Runs a Rhai script's process(x, y) for every pixel.",
            OperatorKind::Output => "Terminal node; its input is the rendered result.",
            OperatorKind::Plugin => "Host-provided operator.",
        }
    }
}

impl std::fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_excludes_output_and_plugin() {
        assert!(!OperatorKind::all().contains(&OperatorKind::Output));
        assert!(!OperatorKind::all().contains(&OperatorKind::Plugin));
        assert_eq!(OperatorKind::all().len(), 19);
    }

    #[test]
    fn test_kind_serde_round_trip() {
        let json = serde_json::to_string(&OperatorKind::BrightnessContrast).unwrap();
        assert_eq!(json, "\"BrightnessContrast\"");
        let back: OperatorKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, OperatorKind::BrightnessContrast);
    }
}
