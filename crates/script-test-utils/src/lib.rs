//! Testing utilities for the script tree workspace
//!
//! Shared fixtures, node builders and tracing setup.

#![allow(missing_docs)]

use std::sync::Once;

use script_tree::{NodeId, NodeType, ScriptDocument, ScriptNode};
use tracing_subscriber::EnvFilter;

pub const TEST_PLAN_ID: &str = "tp";
pub const THREAD_GROUP_ID: &str = "tg";

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once; level from `RUST_LOG`, default `warn`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

pub fn node(id: &str, node_type: NodeType, children: Vec<ScriptNode>) -> ScriptNode {
    let name = match node_type {
        NodeType::TestPlan => "TestPlan",
        NodeType::ThreadGroup => "ThreadGroup",
        NodeType::Controller => "TransactionController",
        NodeType::Sampler => "HTTPSamplerProxy",
        NodeType::Other(_) => "ConfigTestElement",
    };
    ScriptNode::builder(name, node_type, id)
        .test_name(format!("{name} {id}"))
        .md5(format!("md5-{id}"))
        .xpath(format!("/jmeterTestPlan/hashTree/{name}[{id}]"))
        .children(children)
        .build()
}

pub fn sampler(id: &str) -> ScriptNode {
    node(id, NodeType::Sampler, Vec::new())
}

pub fn controller(id: &str, children: Vec<ScriptNode>) -> ScriptNode {
    node(id, NodeType::Controller, children)
}

/// `TestPlan -> ThreadGroup -> [children]`
pub fn plan_with(children: Vec<ScriptNode>) -> ScriptDocument {
    ScriptDocument::new(vec![node(
        TEST_PLAN_ID,
        NodeType::TestPlan,
        vec![node(THREAD_GROUP_ID, NodeType::ThreadGroup, children)],
    )])
}

/// `TestPlan -> ThreadGroup -> [S1, C1 -> S2]`
pub fn sample_plan() -> ScriptDocument {
    plan_with(vec![sampler("S1"), controller("C1", vec![sampler("S2")])])
}

pub fn sample_plan_json() -> String {
    sample_plan().to_json().unwrap()
}

/// Converter output for a small recorded HTTP plan
pub fn recorded_plan_json() -> &'static str {
    r#"[
  {
    "name": "TestPlan",
    "testName": "order flow",
    "md5": "5b1b8d0f2d3e4a8c9f6e7d1a2b3c4d5e",
    "type": "TEST_PLAN",
    "xpath": "/jmeterTestPlan/hashTree/TestPlan",
    "xpathMd5": "0d6f2c4a9e1b3d5f7a8c0e2b4d6f8a1c",
    "props": {"TestPlan.functional_mode": "false", "TestPlan.serialize_threadgroups": "false"},
    "children": [
      {
        "name": "ThreadGroup",
        "testName": "users",
        "md5": "d0bba04950f1e3e68e7d97d614b0b5b9",
        "type": "THREAD_GROUP",
        "xpath": "/jmeterTestPlan/hashTree/hashTree/ThreadGroup[1]",
        "xpathMd5": "cec45d27c5e20cca29526c54b4c9ad34",
        "props": {"ThreadGroup.num_threads": "10", "ThreadGroup.ramp_time": "5"},
        "children": [
          {
            "name": "HTTPSamplerProxy",
            "testName": "login",
            "md5": "7be1c5f0a9d84e2b8f3a6c1d0e9b2a47",
            "type": "SAMPLER",
            "xpath": "/jmeterTestPlan/hashTree/hashTree/hashTree/HTTPSamplerProxy[1]",
            "xpathMd5": "a1f3e5c7b9d1f3a5c7e9b1d3f5a7c9e1",
            "props": {"HTTPSampler.path": "/user/login", "HTTPSampler.method": "POST", "HTTPSampler.connect_timeout": "15000"},
            "identification": "http#/user/login#POST",
            "children": []
          },
          {
            "name": "TransactionController",
            "testName": "checkout",
            "md5": "c3d5e7f9a1b3c5d7e9f1a3b5c7d9e1f3",
            "type": "CONTROLLER",
            "xpath": "/jmeterTestPlan/hashTree/hashTree/hashTree/TransactionController[1]",
            "xpathMd5": "b2e4f6a8c0d2e4f6a8b0c2d4e6f8a0b2",
            "props": {"TransactionController.parent": "true"},
            "children": [
              {
                "name": "HTTPSamplerProxy",
                "testName": "create order",
                "md5": "e5f7a9b1c3d5e7f9a1b3c5d7e9f1a3b5",
                "type": "SAMPLER",
                "xpath": "/jmeterTestPlan/hashTree/hashTree/hashTree/hashTree/HTTPSamplerProxy[1]",
                "xpathMd5": "f6a8b0c2d4e6f8a0b2c4d6e8f0a2b4c6",
                "props": {"HTTPSampler.path": "/order/createOrder.do", "HTTPSampler.method": "POST"},
                "identification": "http#/order/createOrder.do#POST",
                "children": []
              },
              {
                "name": "ConstantTimer",
                "testName": "think time",
                "md5": "a7b9c1d3e5f7a9b1c3d5e7f9a1b3c5d7",
                "type": "TIMER",
                "xpath": "/jmeterTestPlan/hashTree/hashTree/hashTree/hashTree/ConstantTimer[1]",
                "xpathMd5": "c8d0e2f4a6b8c0d2e4f6a8b0c2d4e6f8",
                "enabled": true,
                "children": []
              }
            ]
          }
        ]
      }
    ]
  }
]"#
}

pub const LOGIN_SAMPLER_ID: &str = "a1f3e5c7b9d1f3a5c7e9b1d3f5a7c9e1";
pub const CHECKOUT_CONTROLLER_ID: &str = "b2e4f6a8c0d2e4f6a8b0c2d4e6f8a0b2";
pub const CREATE_ORDER_SAMPLER_ID: &str = "f6a8b0c2d4e6f8a0b2c4d6e8f0a2b4c6";
pub const RECORDED_THREAD_GROUP_ID: &str = "cec45d27c5e20cca29526c54b4c9ad34";

/// Ids in pre-order
pub fn preorder_ids(doc: &ScriptDocument) -> Vec<String> {
    doc.iter().map(|visit| visit.node.id().to_string()).collect()
}

/// Ids of a node list in order
pub fn ids_of(nodes: &[ScriptNode]) -> Vec<String> {
    nodes.iter().map(|node| node.id().to_string()).collect()
}

pub fn parse(text: &str) -> ScriptDocument {
    ScriptDocument::from_json(text).unwrap()
}

pub fn contains_id(doc: &ScriptDocument, id: &str) -> bool {
    doc.locate(&NodeId::from(id)).is_some()
}
