//! Canonical financial concepts and the US-GAAP tags they are reported under.
//!
//! Filers use inconsistent element names for the same line item (revenue
//! alone has at least five common variants). Each [`Concept`] lists its
//! aliases in priority order; the first alias present in a filing wins.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Concept {
    Revenue,
    CostOfGoodsSold,
    GrossProfit,
    NetIncome,
    TotalAssets,
    CurrentAssets,
    CurrentLiabilities,
    Receivables,
    Inventory,
    #[serde(rename = "PPE")]
    Ppe,
    Depreciation,
    #[serde(rename = "SGA")]
    Sga,
    TotalLiabilities,
    LongTermDebt,
    StockholdersEquity,
    CashFlowFromOperations,
    MarketValueOfEquity,
    RetainedEarnings,
    #[serde(rename = "EBIT")]
    Ebit,
    SharesOutstanding,
    Cash,
}

impl Concept {
    pub const ALL: [Concept; 21] = [
        Concept::Revenue,
        Concept::CostOfGoodsSold,
        Concept::GrossProfit,
        Concept::NetIncome,
        Concept::TotalAssets,
        Concept::CurrentAssets,
        Concept::CurrentLiabilities,
        Concept::Receivables,
        Concept::Inventory,
        Concept::Ppe,
        Concept::Depreciation,
        Concept::Sga,
        Concept::TotalLiabilities,
        Concept::LongTermDebt,
        Concept::StockholdersEquity,
        Concept::CashFlowFromOperations,
        Concept::MarketValueOfEquity,
        Concept::RetainedEarnings,
        Concept::Ebit,
        Concept::SharesOutstanding,
        Concept::Cash,
    ];

    /// US-GAAP element names, highest priority first.
    pub fn tag_aliases(self) -> &'static [&'static str] {
        match self {
            Self::Revenue => &[
                "Revenues",
                "RevenueFromContractWithCustomerExcludingAssessedTax",
                "SalesRevenueNet",
                "RevenueFromContractWithCustomerIncludingAssessedTax",
                "SalesRevenueGoodsNet",
            ],
            Self::CostOfGoodsSold => &[
                "CostOfRevenue",
                "CostOfGoodsAndServicesSold",
                "CostOfGoodsSold",
                "CostOfServices",
            ],
            Self::GrossProfit => &["GrossProfit"],
            Self::NetIncome => &[
                "NetIncomeLoss",
                "ProfitLoss",
                "NetIncomeLossAvailableToCommonStockholdersBasic",
            ],
            Self::TotalAssets => &["Assets"],
            Self::CurrentAssets => &["AssetsCurrent"],
            Self::CurrentLiabilities => &["LiabilitiesCurrent"],
            Self::Receivables => &[
                "AccountsReceivableNetCurrent",
                "ReceivablesNetCurrent",
                "AccountsNotesAndLoansReceivableNetCurrent",
            ],
            Self::Inventory => &["InventoryNet", "InventoryGross"],
            Self::Ppe => &[
                "PropertyPlantAndEquipmentNet",
                "PropertyPlantAndEquipmentAndFinanceLeaseRightOfUseAssetAfterAccumulatedDepreciationAndAmortization",
            ],
            Self::Depreciation => &[
                "Depreciation",
                "DepreciationDepletionAndAmortization",
                "DepreciationAndAmortization",
                "DepreciationAmortizationAndAccretionNet",
            ],
            Self::Sga => &[
                "SellingGeneralAndAdministrativeExpense",
                "GeneralAndAdministrativeExpense",
            ],
            Self::TotalLiabilities => &["Liabilities"],
            Self::LongTermDebt => &[
                "LongTermDebtNoncurrent",
                "LongTermDebt",
                "LongTermDebtAndCapitalLeaseObligations",
            ],
            Self::StockholdersEquity => &[
                "StockholdersEquity",
                "StockholdersEquityIncludingPortionAttributableToNoncontrollingInterest",
            ],
            Self::CashFlowFromOperations => &[
                "NetCashProvidedByUsedInOperatingActivities",
                "NetCashProvidedByUsedInOperatingActivitiesContinuingOperations",
            ],
            Self::MarketValueOfEquity => &["EntityPublicFloat", "MarketValueOfEquity"],
            Self::RetainedEarnings => &["RetainedEarningsAccumulatedDeficit"],
            Self::Ebit => &[
                "OperatingIncomeLoss",
                "IncomeLossFromContinuingOperationsBeforeInterestExpenseInterestIncomeIncomeTaxesExtraordinaryItemsNoncontrollingInterestsNet",
            ],
            Self::SharesOutstanding => &[
                "CommonStockSharesOutstanding",
                "EntityCommonStockSharesOutstanding",
                "WeightedAverageNumberOfSharesOutstandingBasic",
            ],
            Self::Cash => &[
                "CashAndCashEquivalentsAtCarryingValue",
                "CashCashEquivalentsRestrictedCashAndRestrictedCashEquivalents",
                "Cash",
            ],
        }
    }

    /// Position of `tag` in this concept's alias list, if it is one.
    pub fn alias_rank(self, tag: &str) -> Option<usize> {
        self.tag_aliases().iter().position(|a| *a == tag)
    }

    /// Resolve a raw tag to the concept it reports, with its alias rank.
    pub fn from_tag(tag: &str) -> Option<(Concept, usize)> {
        Concept::ALL
            .iter()
            .find_map(|c| c.alias_rank(tag).map(|rank| (*c, rank)))
    }
}

impl std::fmt::Display for Concept {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Revenue => "Revenue",
            Self::CostOfGoodsSold => "CostOfGoodsSold",
            Self::GrossProfit => "GrossProfit",
            Self::NetIncome => "NetIncome",
            Self::TotalAssets => "TotalAssets",
            Self::CurrentAssets => "CurrentAssets",
            Self::CurrentLiabilities => "CurrentLiabilities",
            Self::Receivables => "Receivables",
            Self::Inventory => "Inventory",
            Self::Ppe => "PPE",
            Self::Depreciation => "Depreciation",
            Self::Sga => "SGA",
            Self::TotalLiabilities => "TotalLiabilities",
            Self::LongTermDebt => "LongTermDebt",
            Self::StockholdersEquity => "StockholdersEquity",
            Self::CashFlowFromOperations => "CashFlowFromOperations",
            Self::MarketValueOfEquity => "MarketValueOfEquity",
            Self::RetainedEarnings => "RetainedEarnings",
            Self::Ebit => "EBIT",
            Self::SharesOutstanding => "SharesOutstanding",
            Self::Cash => "Cash",
        };
        f.write_str(name)
    }
}
