//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use serde_json::{Value, json};

use taxoflow::{
    TaxoflowError,
    config::AppConfig,
    error::LayoutError,
    layout::{AutoEngine, LayoutEngine, LayoutGraph, PositionedGraph},
    layout_options::LayoutOptions,
    loader::JsonFetcher,
};

/// Serves datasets from memory, keyed by data source.
///
/// Every fetch yields to the executor once before completing, so joined
/// futures interleave the way real network requests do.
#[derive(Default)]
pub struct MemoryFetcher {
    documents: RefCell<HashMap<String, Value>>,
    fetches: Cell<usize>,
}

impl MemoryFetcher {
    /// A fetcher serving one dataset for each configured diagram.
    pub fn bioenergy(config: &AppConfig) -> Self {
        let fetcher = Self::default();
        for (id, diagram) in &config.diagrams {
            fetcher.replace(&diagram.data_source, dataset(id));
        }
        fetcher
    }

    /// Serves `value` for `url` from now on.
    pub fn replace(&self, url: &str, value: Value) {
        self.documents.borrow_mut().insert(url.to_string(), value);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.get()
    }
}

impl JsonFetcher for MemoryFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, TaxoflowError> {
        self.fetches.set(self.fetches.get() + 1);
        YieldOnce::default().await;
        self.documents
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| TaxoflowError::Http {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// Lays out with [`AutoEngine`] after yielding to the executor twice, so
/// other joined futures run while the layout is in flight.
#[derive(Debug, Default)]
pub struct YieldingEngine {
    inner: AutoEngine,
}

impl LayoutEngine for YieldingEngine {
    async fn layout(
        &self,
        graph: &LayoutGraph,
        options: &LayoutOptions,
    ) -> Result<PositionedGraph, LayoutError> {
        yield_now().await;
        yield_now().await;
        self.inner.layout(graph, options).await
    }
}

/// Returns to the executor once.
pub async fn yield_now() {
    YieldOnce::default().await;
}

#[derive(Default)]
struct YieldOnce {
    yielded: bool,
}

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

pub fn property(id: i64, value: f64, name_english: &str) -> Value {
    json!({
        "id": id,
        "value": value,
        "unit": {"id": 1, "name_german": "Prozent", "name_english": "percent"},
        "property": {"id": id + 1000, "name_german": name_english, "name_english": name_english},
        "reference": {"id": null, "source": null}
    })
}

fn entity(id: i64, name: &str) -> Value {
    json!({"id": id, "name_german": name, "name_english": name})
}

fn with_children(mut parent: Value, key: &str, children: Vec<Value>) -> Value {
    parent[key] = Value::Array(children);
    parent
}

fn with_properties(mut entity: Value, properties: Vec<Value>) -> Value {
    entity["properties"] = Value::Array(properties);
    entity
}

/// A small dataset in the shape the diagram's transform expects: two
/// categories, the first with two children carrying properties.
pub fn dataset(diagram_id: &str) -> Value {
    let three_level = |key: &str| {
        json!([
            with_children(entity(1, "first"), key, vec![
                with_properties(entity(10, "alpha"), vec![property(1, 5.0, "mass")]),
                with_properties(entity(11, "beta"), vec![property(2, 7.5, "volume")]),
            ]),
            with_children(entity(2, "second"), key, vec![]),
        ])
    };
    let four_level = |group_key: &str, leaf_key: &str| {
        json!([
            with_children(entity(1, "first"), group_key, vec![
                with_children(entity(10, "alpha"), leaf_key, vec![
                    with_properties(entity(100, "leaf one"), vec![property(1, 5.0, "mass")]),
                    with_properties(entity(101, "leaf two"), vec![property(2, 7.5, "volume")]),
                ]),
                with_children(entity(11, "beta"), leaf_key, vec![]),
            ]),
            with_children(entity(2, "second"), group_key, vec![]),
        ])
    };

    match diagram_id {
        "supply_tasks" => three_level("tasks"),
        "supply_concepts" => three_level("concepts"),
        "conversion_procedures" => three_level("components"),
        "process_chains" => four_level("groups", "chains"),
        "xducts" => four_level("xduct_groups", "xducts"),
        _ => json!([]),
    }
}
