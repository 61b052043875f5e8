//! In-memory `DealApi` test double with scripted failures and gates that
//! hold a call open until the test releases it.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dealboard_common::{Deal, DealId, DealPage, NewDeal, Stage};
use tokio::sync::Semaphore;

use super::{DealApi, DealQuery};
use crate::errors::ClientError;
use crate::merge::{MergeOutcome, MergePreview, MergeSelection};

/// Scripted response for one `list_deals` call.
pub struct ListStep {
    pub gate: Option<Arc<Semaphore>>,
    pub result: Result<Vec<Deal>, String>,
}

/// Scripted response for one merge call.
pub enum MergeStep {
    Preview(MergePreview),
    Commit(MergeOutcome),
    Fail { status: u16, message: String },
}

#[derive(Default)]
pub struct FakeDealApi {
    pub deals: Mutex<Vec<Deal>>,
    pub list_script: Mutex<VecDeque<ListStep>>,
    pub move_script: Mutex<VecDeque<Result<(), String>>>,
    pub move_gate: Mutex<Option<Arc<Semaphore>>>,
    pub merge_script: Mutex<VecDeque<MergeStep>>,
    pub create_error: Mutex<Option<String>>,
    pub list_calls: Mutex<Vec<DealQuery>>,
    pub move_calls: Mutex<Vec<(DealId, Stage)>>,
    pub merge_calls: Mutex<Vec<(MergeSelection, bool)>>,
}

fn rejected(message: String) -> ClientError {
    ClientError::Status {
        status: 422,
        message,
    }
}

impl FakeDealApi {
    pub fn with_deals(deals: Vec<Deal>) -> Arc<Self> {
        Arc::new(Self {
            deals: Mutex::new(deals),
            ..Default::default()
        })
    }

    pub fn push_list(&self, gate: Option<Arc<Semaphore>>, result: Result<Vec<Deal>, String>) {
        self.list_script
            .lock()
            .unwrap()
            .push_back(ListStep { gate, result });
    }

    pub fn fail_next_move(&self, message: &str) {
        self.move_script
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    /// Hold every following move until the returned semaphore gets permits.
    pub fn hold_moves(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.move_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn push_merge(&self, step: MergeStep) {
        self.merge_script.lock().unwrap().push_back(step);
    }

    pub fn move_count(&self) -> usize {
        self.move_calls.lock().unwrap().len()
    }
}

async fn pass(gate: Option<Arc<Semaphore>>) {
    if let Some(gate) = gate {
        gate.acquire().await.unwrap().forget();
    }
}

#[async_trait]
impl DealApi for FakeDealApi {
    async fn list_deals(&self, query: &DealQuery) -> Result<DealPage, ClientError> {
        self.list_calls.lock().unwrap().push(query.clone());
        let step = self.list_script.lock().unwrap().pop_front();
        let result = match step {
            Some(step) => {
                pass(step.gate).await;
                step.result
            }
            None => Ok(self.deals.lock().unwrap().clone()),
        };
        let items = result.map_err(rejected)?;
        let total = items.len() as u64;
        Ok(DealPage { items, total })
    }

    async fn create_deal(&self, deal: &NewDeal) -> Result<Deal, ClientError> {
        if let Some(message) = self.create_error.lock().unwrap().clone() {
            return Err(rejected(message));
        }
        let mut deals = self.deals.lock().unwrap();
        let mut created = Deal::new(format!("new-{}", deals.len() + 1), Stage::Lead);
        created.title = deal.title.clone();
        created.amount = deal.amount;
        created.currency = deal.currency.clone();
        deals.push(created.clone());
        Ok(created)
    }

    async fn move_deal(&self, id: &DealId, stage: Stage) -> Result<(), ClientError> {
        self.move_calls.lock().unwrap().push((id.clone(), stage));
        let gate = self.move_gate.lock().unwrap().clone();
        pass(gate).await;
        match self.move_script.lock().unwrap().pop_front() {
            Some(Err(message)) => Err(rejected(message)),
            _ => Ok(()),
        }
    }

    async fn preview_merge(&self, selection: &MergeSelection) -> Result<MergePreview, ClientError> {
        self.merge_calls
            .lock()
            .unwrap()
            .push((selection.clone(), true));
        match self.merge_script.lock().unwrap().pop_front() {
            Some(MergeStep::Preview(preview)) => Ok(preview),
            Some(MergeStep::Fail { status, message }) => Err(ClientError::Status { status, message }),
            _ => Ok(MergePreview::empty(selection)),
        }
    }

    async fn commit_merge(&self, selection: &MergeSelection) -> Result<MergeOutcome, ClientError> {
        self.merge_calls
            .lock()
            .unwrap()
            .push((selection.clone(), false));
        match self.merge_script.lock().unwrap().pop_front() {
            Some(MergeStep::Commit(outcome)) => Ok(outcome),
            Some(MergeStep::Fail { status, message }) => Err(ClientError::Status { status, message }),
            _ => Ok(MergeOutcome {
                primary_id: selection.primary_id().to_string(),
                merged_ids: selection.duplicate_ids().to_vec(),
                moved: Default::default(),
            }),
        }
    }
}
