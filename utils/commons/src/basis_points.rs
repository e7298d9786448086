use super::*;

use core::ops::Add;

/// Rate denominator.
const SCALE: u128 = 10_000;

/// Rate in basis points, 1/10000 fractions of a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, SchemaType)]
pub struct BasisPoints(u64);

impl BasisPoints {
    pub const fn new(basis_points: u64) -> Self {
        Self(basis_points)
    }

    pub const fn whole() -> Self {
        Self(SCALE as u64)
    }

    /// This rate's share of the given amount, rounded down.
    pub fn share_of(self, amount: AssetAmount) -> AssetAmount {
        (amount as u128 * self.0 as u128 / SCALE) as AssetAmount
    }

    /// Smallest amount that beats `amount` by this rate, rounded down and
    /// saturating at the largest representable amount.
    pub fn raise(self, amount: AssetAmount) -> AssetAmount {
        let raised = amount as u128 * (SCALE + self.0 as u128) / SCALE;
        core::cmp::min(raised, AssetAmount::MAX as u128) as AssetAmount
    }

    /// Whether `part` stays within this rate's share of `total`.
    pub fn covers(self, part: AssetAmount, total: AssetAmount) -> bool {
        part as u128 * SCALE <= total as u128 * self.0 as u128
    }
}

impl Add for BasisPoints {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        BasisPoints(self.0.saturating_add(rhs.0))
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;

    #[concordium_test]
    fn test_share_rounds_down() {
        claim_eq!(BasisPoints::new(100).share_of(10_000), 100);
        claim_eq!(BasisPoints::new(100).share_of(10_050), 100);
        claim_eq!(BasisPoints::new(1_000).share_of(10_000), 1_000);
        claim_eq!(BasisPoints::new(333).share_of(99), 3);
        claim_eq!(BasisPoints::new(0).share_of(u64::MAX), 0);
    }

    #[concordium_test]
    fn test_share_no_overflow() {
        claim_eq!(BasisPoints::whole().share_of(u64::MAX), u64::MAX);
    }

    #[concordium_test]
    fn test_raise() {
        claim_eq!(BasisPoints::new(100).raise(10_000), 10_100);
        claim_eq!(BasisPoints::new(1_000).raise(10_000), 11_000);
        // Rounds down, so small amounts may not grow at all
        claim_eq!(BasisPoints::new(100).raise(50), 50);
    }

    #[concordium_test]
    fn test_raise_saturates() {
        claim_eq!(BasisPoints::whole().raise(u64::MAX), u64::MAX);
    }

    #[concordium_test]
    fn test_add_saturates() {
        let huge = BasisPoints::new(1 << 63);
        claim!(huge + huge > BasisPoints::whole());
    }

    #[concordium_test]
    fn test_covers() {
        let limit = BasisPoints::new(8_000);
        claim!(limit.covers(8_000, 10_000));
        claim!(!limit.covers(8_001, 10_000));
        claim!(limit.covers(0, 0));
        claim!(!limit.covers(1, 0));
    }
}
