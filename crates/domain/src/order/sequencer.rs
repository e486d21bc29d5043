//! Order number sequencing.

use std::sync::Arc;

use chrono::NaiveDate;
use common::OrderNumber;
use store::UnitOfWork;
use tokio::sync::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::error::OrderError;

#[derive(Debug, Default)]
struct SequenceState {
    /// Next sequence to hand out; `None` until first derived from storage.
    next: Option<u32>,
    /// Date the counter was last derived or used on.
    day: Option<NaiveDate>,
}

/// Hands out `YYMMDD` + 5-digit order numbers from an in-process counter.
///
/// The counter is derived from the most recent persisted order on first use
/// and again on the first use of each new calendar day. It is advanced on
/// every issued number, whether or not the order is eventually stored, so
/// the sequence may have gaps.
///
/// The counter lives in this process only. Running several instances
/// against one database needs a database-side sequence instead.
pub struct OrderNumberSequencer {
    state: Mutex<SequenceState>,
    clock: Arc<dyn Clock>,
}

impl OrderNumberSequencer {
    /// Creates a sequencer stamped with the server's local date.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(SequenceState::default()),
            clock,
        }
    }

    /// Issues the next order number.
    ///
    /// Reads the order history through `uow` only when the counter needs to
    /// be (re)derived. A failed read leaves the counter untouched.
    ///
    /// Past 99999 the counter wraps to 1 without checking for numbers
    /// already issued that day.
    #[tracing::instrument(skip_all)]
    pub async fn next_order_number<U: UnitOfWork>(
        &self,
        uow: &mut U,
    ) -> Result<OrderNumber, OrderError> {
        let today = self.clock.today();
        let mut state = self.state.lock().await;

        let mut next = match state.next {
            Some(next) if state.day == Some(today) => next,
            cached => {
                let last = uow
                    .find_most_recent_order()
                    .await?
                    .map(|o| o.order_number.sequence())
                    .unwrap_or(0);
                let derived = last + 1;
                tracing::debug!(last, derived, "derived order sequence from storage");
                cached.map_or(derived, |c| c.max(derived))
            }
        };

        if next > OrderNumber::MAX_SEQUENCE {
            tracing::warn!("order sequence exceeded {}, wrapping to 1", OrderNumber::MAX_SEQUENCE);
            next = 1;
        }

        state.next = Some(next + 1);
        state.day = Some(today);

        Ok(OrderNumber::compose(today, next))
    }
}

impl Default for OrderNumberSequencer {
    fn default() -> Self {
        Self::new()
    }
}
