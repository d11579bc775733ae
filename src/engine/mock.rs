/*
 * Copyright 2024 Oxide Computer Company
 */

/*
 * An in-memory SNMP agent, for tests and for trying things out without a
 * device on the network.
 */

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Result;

use super::{Engine, Response, Target};
use crate::{value::Value, Oid};

/**
 * How a request under a faulty prefix is answered.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /**
     * As if the device never answered.
     */
    Timeout,
    /**
     * An SNMP error status (and index) from the device.
     */
    Status { status: u32, index: u32 },
}

/**
 * A request as the mock saw it.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Get(Oid),
    Bulk { oid: Oid, max_repetitions: u32 },
    Next(Oid),
    Set(Oid, Value),
}

impl Request {
    pub fn oid(&self) -> Oid {
        match self {
            Request::Get(oid)
            | Request::Bulk { oid, .. }
            | Request::Next(oid)
            | Request::Set(oid, _) => *oid,
        }
    }

    pub fn is_page(&self) -> bool {
        matches!(self, Request::Bulk { .. } | Request::Next(_))
    }
}

#[derive(Default)]
struct MockState {
    data: BTreeMap<Oid, Value>,
    faults: Vec<(Oid, Fault)>,
    requests: Vec<Request>,
}

/**
 * Answers requests from an ordered OID map the way an agent would: get-next
 * and get-bulk return whatever follows the requested OID regardless of
 * subtree, so bulk pages run on into the next table.
 */
#[derive(Default)]
pub struct MockEngine {
    state: Mutex<MockState>,
}

impl MockEngine {
    pub fn new() -> MockEngine {
        MockEngine::default()
    }

    pub fn with_data<I>(data: I) -> MockEngine
    where
        I: IntoIterator<Item = (Oid, Value)>,
    {
        let mock = MockEngine::default();
        mock.state().data.extend(data);
        mock
    }

    pub fn insert(&self, oid: Oid, value: Value) {
        self.state().data.insert(oid, value);
    }

    pub fn value(&self, oid: &Oid) -> Option<Value> {
        self.state().data.get(oid).cloned()
    }

    /**
     * Answer every request for an OID at or below `prefix` with `fault`.
     */
    pub fn fail_under(&self, prefix: Oid, fault: Fault) {
        self.state().faults.push((prefix, fault));
    }

    pub fn clear_faults(&self) {
        self.state().faults.clear();
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state().requests.clone()
    }

    /**
     * The number of get-next/get-bulk round trips so far.
     */
    pub fn page_requests(&self) -> usize {
        self.state().requests.iter().filter(|r| r.is_page()).count()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /**
     * Record the request and work out whether it is to fail.
     */
    fn begin(&self, req: Request) -> Option<Response> {
        let mut state = self.state();
        let oid = req.oid();
        state.requests.push(req);

        state.faults.iter().find(|(p, _)| oid.starts_with(p)).map(|(_, f)| {
            match f {
                Fault::Timeout => Response::timed_out(),
                Fault::Status { status, index } => {
                    Response::error_status(*status, *index)
                }
            }
        })
    }

    fn following(&self, oid: &Oid, count: usize) -> Vec<(Oid, Value)> {
        self.state()
            .data
            .range((Bound::Excluded(*oid), Bound::Unbounded))
            .take(count)
            .map(|(k, v)| (*k, v.clone()))
            .collect()
    }
}

/*
 * noSuchName, which is what a v1 agent would say for a missing object.
 */
const NO_SUCH_NAME: u32 = 2;

impl Engine for MockEngine {
    async fn get(&self, _target: &Target, oid: Oid) -> Result<Response> {
        if let Some(res) = self.begin(Request::Get(oid)) {
            return Ok(res);
        }

        Ok(match self.value(&oid) {
            Some(v) => Response::var_binds(vec![(oid, v)]),
            None => Response::error_status(NO_SUCH_NAME, 1),
        })
    }

    async fn bulk_walk(
        &self,
        _target: &Target,
        max_repetitions: u32,
        oid: Oid,
    ) -> Result<Response> {
        if let Some(res) = self.begin(Request::Bulk { oid, max_repetitions })
        {
            return Ok(res);
        }

        let count = usize::try_from(max_repetitions.max(1))?;
        Ok(Response::var_binds(self.following(&oid, count)))
    }

    async fn next_walk(&self, _target: &Target, oid: Oid) -> Result<Response> {
        if let Some(res) = self.begin(Request::Next(oid)) {
            return Ok(res);
        }

        Ok(Response::var_binds(self.following(&oid, 1)))
    }

    async fn set(
        &self,
        _target: &Target,
        oid: Oid,
        value: Value,
    ) -> Result<Response> {
        if let Some(res) = self.begin(Request::Set(oid, value.clone())) {
            return Ok(res);
        }

        self.insert(oid, value.clone());
        Ok(Response::var_binds(vec![(oid, value)]))
    }
}
