//! Provenance lineage graph over a campaign run.
//!
//! The run node is the single root. Models, datasets, and artifacts hang off
//! it directly; decisions form one `next` chain in step order.
use crate::model::{ArtifactRef, DataProvenance, DecisionRecord, DecisionType, ModelProvenance};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

pub const LINEAGE_GRAPH_VERSION: &str = "1.0.0";

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    CampaignRun,
    Model,
    Dataset,
    Artifact,
    Decision,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    UsesModel,
    UsesDataset,
    ProducedArtifact,
    HasDecision,
    Next,
    UsedModel,
    RecordedIn,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LineageNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LineageEdge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LineageGraph {
    pub graph_version: String,
    pub campaign_run_id: String,
    pub nodes: Vec<LineageNode>,
    pub edges: Vec<LineageEdge>,
}

impl LineageGraph {
    fn add_node(&mut self, id: String, kind: NodeKind, label: &str, metadata: Value) {
        let metadata = match metadata {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.nodes.push(LineageNode {
            id,
            kind,
            label: label.to_string(),
            metadata,
        });
    }

    fn add_edge(&mut self, from: &str, to: &str, kind: EdgeKind) {
        self.edges.push(LineageEdge {
            from: from.to_string(),
            to: to.to_string(),
            kind,
        });
    }

    #[cfg(test)]
    fn edges_of(&self, kind: EdgeKind) -> impl Iterator<Item = &LineageEdge> {
        self.edges.iter().filter(move |edge| edge.kind == kind)
    }
}

/// Build the lineage graph for one campaign run.
///
/// Every `tool_result` decision is linked to the first artifact only; results
/// are not attributed to individual artifacts.
pub fn build_lineage_graph(
    campaign_run_id: &str,
    decisions: &[DecisionRecord],
    artifacts: &[ArtifactRef],
    models: &[ModelProvenance],
    datasets: &[DataProvenance],
) -> LineageGraph {
    let mut graph = LineageGraph {
        graph_version: LINEAGE_GRAPH_VERSION.to_string(),
        campaign_run_id: campaign_run_id.to_string(),
        nodes: Vec::new(),
        edges: Vec::new(),
    };

    let run_node = format!("run:{campaign_run_id}");
    graph.add_node(
        run_node.clone(),
        NodeKind::CampaignRun,
        campaign_run_id,
        json!({
            "decision_count": decisions.len(),
            "artifact_count": artifacts.len(),
            "model_count": models.len(),
            "data_count": datasets.len(),
        }),
    );

    let mut models_by_tool: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for (offset, model) in models.iter().enumerate() {
        let node = format!("model:{}", offset + 1);
        graph.add_node(
            node.clone(),
            NodeKind::Model,
            &model.model_name,
            json!({
                "version": model.model_version,
                "tool": model.tool,
                "backend": model.backend,
                "parameters": model.parameters,
            }),
        );
        graph.add_edge(&run_node, &node, EdgeKind::UsesModel);
        if let Some(tool) = model.tool.as_deref() {
            models_by_tool.entry(tool).or_default().push(node);
        }
    }

    for (offset, dataset) in datasets.iter().enumerate() {
        let node = format!("data:{}", offset + 1);
        graph.add_node(
            node.clone(),
            NodeKind::Dataset,
            &dataset.dataset_id,
            json!({
                "version": dataset.version,
                "source_url": dataset.source_url,
                "sha256": dataset.sha256,
                "license_name": dataset.license_name,
                "manifest_rel_path": dataset.manifest_rel_path,
                "metadata": dataset.metadata,
            }),
        );
        graph.add_edge(&run_node, &node, EdgeKind::UsesDataset);
    }

    let mut artifact_nodes = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let node = format!("artifact:{}", artifact.artifact_id);
        graph.add_node(
            node.clone(),
            NodeKind::Artifact,
            &artifact.rel_path,
            json!({
                "role": artifact.role,
                "sha256": artifact.sha256,
                "size_bytes": artifact.size_bytes,
                "media_type": artifact.media_type,
                "metadata": artifact.metadata,
            }),
        );
        graph.add_edge(&run_node, &node, EdgeKind::ProducedArtifact);
        artifact_nodes.push(node);
    }

    let mut ordered: Vec<&DecisionRecord> = decisions.iter().collect();
    ordered.sort_by_key(|decision| decision.step_index);

    let mut previous: Option<String> = None;
    for decision in ordered {
        let node = format!("decision:{}", decision.decision_id);
        graph.add_node(
            node.clone(),
            NodeKind::Decision,
            decision.decision_type.as_str(),
            json!({
                "step_index": decision.step_index,
                "actor": decision.actor,
                "tool": decision.tool,
                "timestamp": decision.timestamp,
                "rationale": decision.rationale,
                "input_refs": decision.input_refs,
                "output_refs": decision.output_refs,
                "metadata": decision.metadata,
            }),
        );
        graph.add_edge(&run_node, &node, EdgeKind::HasDecision);
        if let Some(prev) = previous.as_deref() {
            graph.add_edge(prev, &node, EdgeKind::Next);
        }

        if let Some(model_nodes) = decision
            .tool
            .as_deref()
            .and_then(|tool| models_by_tool.get(tool))
        {
            for model_node in model_nodes {
                graph.add_edge(&node, model_node, EdgeKind::UsedModel);
            }
        }

        if decision.decision_type == DecisionType::ToolResult {
            if let Some(first_artifact) = artifact_nodes.first() {
                graph.add_edge(&node, first_artifact, EdgeKind::RecordedIn);
            }
        }
        previous = Some(node);
    }

    graph
}
