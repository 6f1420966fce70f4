use serde::{Deserialize, Serialize};

/// Correctness rule shared by a contiguous run of trials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockMode {
    MoreThanHalf,
    MoreThanFifty,
    MoreThanSixty,
    MoreThanSeventyFive,
}

impl BlockMode {
    pub const ALL: [BlockMode; 4] = [
        BlockMode::MoreThanHalf,
        BlockMode::MoreThanFifty,
        BlockMode::MoreThanSixty,
        BlockMode::MoreThanSeventyFive,
    ];

    /// Share of the total that set A has to strictly exceed, as `num / den`.
    pub fn threshold(&self) -> Ratio {
        match self {
            Self::MoreThanHalf | Self::MoreThanFifty => Ratio::new(1, 2),
            Self::MoreThanSixty => Ratio::new(3, 5),
            Self::MoreThanSeventyFive => Ratio::new(3, 4),
        }
    }

    /// Whether "yes" is the right answer for set A against set B.
    ///
    /// Half and Fifty compare counts directly; Sixty and SeventyFive compare
    /// `count_a / (count_a + count_b)` against the threshold. The comparison
    /// is done in integers so a pair sitting exactly on the threshold never
    /// counts as "more than".
    pub fn is_satisfied(&self, count_a: u32, count_b: u32) -> bool {
        match self {
            Self::MoreThanHalf | Self::MoreThanFifty => count_a > count_b,
            Self::MoreThanSixty | Self::MoreThanSeventyFive => {
                let total = count_a as u64 + count_b as u64;
                if total == 0 {
                    return false;
                }
                let t = self.threshold();
                count_a as u64 * t.den as u64 > t.num as u64 * total
            }
        }
    }

    pub fn percent(&self) -> u32 {
        match self {
            Self::MoreThanHalf | Self::MoreThanFifty => 50,
            Self::MoreThanSixty => 60,
            Self::MoreThanSeventyFive => 75,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::MoreThanHalf => "more than half",
            Self::MoreThanFifty => "more than 50%",
            Self::MoreThanSixty => "more than 60%",
            Self::MoreThanSeventyFive => "more than 75%",
        }
    }
}

/// Target proportion between the two clusters of a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ratio {
    pub num: u32,
    pub den: u32,
}

impl Ratio {
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    pub fn sum(&self) -> u32 {
        self.num + self.den
    }

    pub fn scaled(&self, factor: u32) -> (u32, u32) {
        (self.num * factor, self.den * factor)
    }

    /// `num / (num + den)`
    pub fn proportion(&self) -> f64 {
        self.num as f64 / self.sum() as f64
    }
}
