/// A named dot color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DotColor {
    pub name: &'static str,
    pub rgba: [u8; 4],
}

impl DotColor {
    pub const fn new(name: &'static str, rgba: [u8; 4]) -> Self {
        Self { name, rgba }
    }
}

pub const BLUE: DotColor = DotColor::new("Blue", [0, 0, 255, 255]);
pub const YELLOW: DotColor = DotColor::new("Yellow", [255, 255, 0, 255]);
pub const GREEN: DotColor = DotColor::new("Green", [0x33, 0xcc, 0x33, 255]);
pub const RED: DotColor = DotColor::new("Red", [255, 0, 0, 255]);
pub const PURPLE: DotColor = DotColor::new("Purple", [128, 0, 128, 255]);
pub const ORANGE: DotColor = DotColor::new("Orange", [255, 165, 0, 255]);
pub const CYAN: DotColor = DotColor::new("Cyan", [0, 255, 255, 255]);
pub const BROWN: DotColor = DotColor::new("Brown", [165, 42, 42, 255]);

/// Every color a cluster or the mask may use.
pub const PALETTE: [DotColor; 8] = [BLUE, YELLOW, GREEN, RED, PURPLE, ORANGE, CYAN, BROWN];

/// Colors for set A and set B during one block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPair {
    pub a: DotColor,
    pub b: DotColor,
}

impl ColorPair {
    pub const fn new(a: DotColor, b: DotColor) -> Self {
        Self { a, b }
    }

    pub fn contains(&self, color: &DotColor) -> bool {
        self.a == *color || self.b == *color
    }
}

pub const COLOR_PAIRS: [ColorPair; 4] = [
    ColorPair::new(BLUE, YELLOW),
    ColorPair::new(GREEN, RED),
    ColorPair::new(PURPLE, ORANGE),
    ColorPair::new(CYAN, BROWN),
];
