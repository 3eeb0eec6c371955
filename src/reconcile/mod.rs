//! Reconciliation gate: matches external sale notifications to inventory
//! and records their financial outcome.
//!
//! Candidates arrive from any source (StockX, Notion, manual entry); the
//! gate validates them, enforces the (platform, external_id) idempotency
//! key, resolves exactly one in-stock item, runs the fee and profitability
//! engines, and persists the order atomically with the item status flip.

pub mod intake;

pub use intake::{Intake, IntakeReport};

use crate::config::RoiPolicy;
use crate::db::{OrderPersistOutcome, Repository};
use crate::domain::{
    ItemRef, ItemStatus, Order, OrderDraft, Platform, PlatformFeeSchedule, SaleCandidate,
};
use crate::engine::{compute_fee, compute_profitability, FeeError};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Why a candidate was turned away.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(
    tag = "kind",
    content = "detail",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum RejectReason {
    #[error("missing required fields: {0:?}")]
    MissingFields(Vec<&'static str>),
    #[error("no fee schedule configured for platform {0}")]
    UnknownPlatform(Platform),
    #[error("fee schedule rejected: {0}")]
    InvalidSchedule(String),
    #[error("no in-stock item matches {0}")]
    ItemNotFound(ItemRef),
    #[error("{matches} in-stock items match {reference}, refusing to guess")]
    AmbiguousItem { reference: ItemRef, matches: usize },
    #[error("item {reference} is {status}, not in stock")]
    ItemNotInStock { reference: ItemRef, status: ItemStatus },
    #[error("item was sold by a concurrent reconciliation")]
    ItemAlreadySold,
    #[error("ROI undefined: purchase price is not positive")]
    UndefinedRoi,
    #[error("storage failure: {0}")]
    StorageFailure(String),
}

impl RejectReason {
    /// Ambiguous resolutions get their own count in the batch report.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, RejectReason::AmbiguousItem { .. })
    }
}

/// Result of pushing one candidate through the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ReconcileOutcome {
    /// Order created, item flipped to sold.
    Created { order: Order },
    /// The sale was already recorded. Nothing written.
    SkippedDuplicate {
        platform: Platform,
        external_id: String,
    },
    /// The candidate was turned away. Nothing written.
    Rejected {
        external_id: String,
        reason: RejectReason,
    },
}

/// Batch summary; per-candidate outcomes ride along so callers never see a
/// silent partial success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub run_id: Uuid,
    pub created: usize,
    pub skipped_duplicate: usize,
    pub rejected_invalid: usize,
    pub rejected_ambiguous: usize,
    pub outcomes: Vec<ReconcileOutcome>,
}

impl ReconcileReport {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            created: 0,
            skipped_duplicate: 0,
            rejected_invalid: 0,
            rejected_ambiguous: 0,
            outcomes: Vec::new(),
        }
    }

    fn record(&mut self, outcome: ReconcileOutcome) {
        match &outcome {
            ReconcileOutcome::Created { .. } => self.created += 1,
            ReconcileOutcome::SkippedDuplicate { .. } => self.skipped_duplicate += 1,
            ReconcileOutcome::Rejected { reason, .. } => {
                if reason.is_ambiguous() {
                    self.rejected_ambiguous += 1;
                } else {
                    self.rejected_invalid += 1;
                }
            }
        }
        self.outcomes.push(outcome);
    }
}

/// The reconciliation gate.
///
/// Holds the fee schedule book (static lookup data, loaded once) and a
/// repository handle. Each `reconcile` call runs in its own database
/// transaction; the gate keeps no other state.
#[derive(Clone)]
pub struct Reconciler {
    repo: Arc<Repository>,
    schedules: HashMap<Platform, PlatformFeeSchedule>,
    roi_policy: RoiPolicy,
}

impl Reconciler {
    pub fn new(
        repo: Arc<Repository>,
        schedules: Vec<PlatformFeeSchedule>,
        roi_policy: RoiPolicy,
    ) -> Self {
        let schedules = schedules
            .into_iter()
            .map(|s| (s.platform.clone(), s))
            .collect();
        Self {
            repo,
            schedules,
            roi_policy,
        }
    }

    /// Make sure every configured platform has a row, so order inserts can
    /// reference it. Called once at startup.
    ///
    /// # Errors
    /// Returns an error if an upsert fails.
    pub async fn seed_platforms(&self) -> Result<(), sqlx::Error> {
        for schedule in self.schedules.values() {
            self.repo.upsert_platform(schedule).await?;
        }
        Ok(())
    }

    /// Push one candidate through the gate.
    ///
    /// Zero writes on Skipped/Rejected outcomes; on Created, the order
    /// insert and the item status flip commit together.
    ///
    /// # Errors
    /// Returns an error when storage fails; the record's transaction is
    /// already rolled back at that point.
    pub async fn reconcile(
        &self,
        candidate: &SaleCandidate,
    ) -> Result<ReconcileOutcome, sqlx::Error> {
        // Step 1: validation.
        let missing = candidate.missing_fields();
        if !missing.is_empty() {
            return Ok(self.reject(candidate, RejectReason::MissingFields(missing)));
        }

        let Some(schedule) = self.schedules.get(&candidate.platform) else {
            return Ok(self.reject(
                candidate,
                RejectReason::UnknownPlatform(candidate.platform.clone()),
            ));
        };

        // Step 2: idempotency fast path. The unique index on
        // (platform_id, external_id) remains the final guard.
        if let Some(existing) = self
            .repo
            .find_order(&candidate.platform, &candidate.external_sale_id)
            .await?
        {
            info!(
                platform = %candidate.platform,
                external_id = %candidate.external_sale_id,
                order_id = existing.id,
                "Sale already recorded, skipping"
            );
            return Ok(ReconcileOutcome::SkippedDuplicate {
                platform: candidate.platform.clone(),
                external_id: candidate.external_sale_id.clone(),
            });
        }

        // Step 3: item resolution, exact keys only.
        let item = match &candidate.item_ref {
            ItemRef::ItemId(id) => match self.repo.get_item(*id).await? {
                None => {
                    return Ok(self.reject(
                        candidate,
                        RejectReason::ItemNotFound(candidate.item_ref.clone()),
                    ))
                }
                Some(item) if item.status != ItemStatus::InStock => {
                    return Ok(self.reject(
                        candidate,
                        RejectReason::ItemNotInStock {
                            reference: candidate.item_ref.clone(),
                            status: item.status,
                        },
                    ))
                }
                Some(item) => item,
            },
            ItemRef::SkuSize { sku, size } => {
                let mut matches = self.repo.find_in_stock_by_sku_size(sku, size).await?;
                match matches.len() {
                    0 => {
                        return Ok(self.reject(
                            candidate,
                            RejectReason::ItemNotFound(candidate.item_ref.clone()),
                        ))
                    }
                    1 => matches.remove(0),
                    n => {
                        return Ok(self.reject(
                            candidate,
                            RejectReason::AmbiguousItem {
                                reference: candidate.item_ref.clone(),
                                matches: n,
                            },
                        ))
                    }
                }
            }
        };

        // Step 4: fee and profitability math.
        let fee = match compute_fee(candidate.sale_price, schedule) {
            Ok(fee) => fee,
            Err(e @ FeeError::InvalidSchedule { .. }) => {
                return Ok(self.reject(candidate, RejectReason::InvalidSchedule(e.to_string())))
            }
            Err(FeeError::NonPositivePrice(_)) => {
                // Validation already requires a positive price.
                return Ok(self.reject(
                    candidate,
                    RejectReason::MissingFields(vec!["sale_price"]),
                ));
            }
        };
        let profitability =
            compute_profitability(&item, candidate.sale_price, candidate.sold_at, &fee);

        if profitability.roi_percent.is_none() && self.roi_policy == RoiPolicy::Reject {
            return Ok(self.reject(candidate, RejectReason::UndefinedRoi));
        }

        // Step 5: atomic persist.
        let draft = OrderDraft {
            inventory_item_id: item.id,
            platform: candidate.platform.clone(),
            external_id: candidate.external_sale_id.clone(),
            sold_at: candidate.sold_at,
            gross_sale: candidate.sale_price.round_money(),
            platform_fee: fee.total_fee,
            net_proceeds: profitability.net_proceeds,
            gross_profit: profitability.gross_profit,
            net_profit: profitability.net_profit,
            roi_percent: profitability.roi_percent,
            shelf_life_days: profitability.shelf_life_days,
            source_payload: candidate.source_payload.clone(),
        };

        match self.repo.create_order_atomic(&draft).await? {
            OrderPersistOutcome::Created(order) => {
                info!(
                    platform = %order.platform,
                    external_id = %order.external_id,
                    item_id = order.inventory_item_id,
                    net_profit = %order.net_profit,
                    "Sale reconciled"
                );
                Ok(ReconcileOutcome::Created { order })
            }
            OrderPersistOutcome::DuplicateExternalId => {
                // A concurrent run recorded the sale between the fast path
                // and the insert.
                info!(
                    platform = %candidate.platform,
                    external_id = %candidate.external_sale_id,
                    "Sale recorded concurrently, skipping"
                );
                Ok(ReconcileOutcome::SkippedDuplicate {
                    platform: candidate.platform.clone(),
                    external_id: candidate.external_sale_id.clone(),
                })
            }
            OrderPersistOutcome::ItemUnavailable => {
                Ok(self.reject(candidate, RejectReason::ItemAlreadySold))
            }
        }
    }

    /// Run a batch of candidates, recovering per record.
    ///
    /// Validation, resolution, and storage failures are confined to their
    /// record; the batch always runs to the end and reports every outcome.
    pub async fn reconcile_batch(&self, candidates: &[SaleCandidate]) -> ReconcileReport {
        let mut report = ReconcileReport::new();

        for candidate in candidates {
            let outcome = match self.reconcile(candidate).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(
                        external_id = %candidate.external_sale_id,
                        error = %e,
                        "Storage failure while reconciling, continuing with next record"
                    );
                    ReconcileOutcome::Rejected {
                        external_id: candidate.external_sale_id.clone(),
                        reason: RejectReason::StorageFailure(e.to_string()),
                    }
                }
            };
            report.record(outcome);
        }

        info!(
            run_id = %report.run_id,
            created = report.created,
            skipped_duplicate = report.skipped_duplicate,
            rejected_invalid = report.rejected_invalid,
            rejected_ambiguous = report.rejected_ambiguous,
            "Reconciliation batch finished"
        );
        report
    }

    fn reject(&self, candidate: &SaleCandidate, reason: RejectReason) -> ReconcileOutcome {
        warn!(
            platform = %candidate.platform,
            external_id = %candidate.external_sale_id,
            reason = %reason,
            "Candidate rejected"
        );
        ReconcileOutcome::Rejected {
            external_id: candidate.external_sale_id.clone(),
            reason,
        }
    }
}
