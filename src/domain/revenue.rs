use super::decimal::Decimal;

/// Revenue attributed to a single fee-bearing event.
///
/// Never persisted on its own; merged into a [`super::Pool`] by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Revenue {
    pub protocol_revenue: Decimal,
    pub protocol_revenue_usd: Decimal,
    pub supply_side_revenue: Decimal,
    pub supply_side_revenue_usd: Decimal,
}

impl Revenue {
    /// Token-denominated total of both components, `None` on overflow.
    pub fn total(&self) -> Option<Decimal> {
        self.protocol_revenue.checked_add(self.supply_side_revenue)
    }

    pub fn total_usd(&self) -> Option<Decimal> {
        self.protocol_revenue_usd
            .checked_add(self.supply_side_revenue_usd)
    }
}
