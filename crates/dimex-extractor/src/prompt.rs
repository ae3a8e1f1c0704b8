//! Prompts for dimension extraction and evaluation

use dimex_domain::{Chunk, ExtractionRecord};

/// Instructions placed before the chunk sequence when none are configured
pub const DEFAULT_INSTRUCTIONS: &str =
    "Please analyze and extract the following dimensions from this research paper:";

/// Built-in extraction system prompt
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an academic analyst specialised in digital supply networks and artificial intelligence.

You read research papers, supplied as a JSON list of text chunks, and extract structured data about them. Use only what the paper states. When a dimension is not addressed, leave the field empty.

1. DCM capability. Pick exactly ONE of the six Digital Capability Model capabilities:

   - Connected Customer: integrated engagement across the customer lifecycle (acquisition, ownership, service, loyalty). Typical topics: capturing customer signals in real time, predictive service, field technician dispatch, service contracts. Typical measures: NPS/CSAT, first-time-fix rate, mean time to resolution.
   - Product Development: innovation from concept to launch on a digital thread. Typical topics: requirements, rapid prototyping, PLM, design collaboration, new product introduction. Typical measures: design cycle time, first-pass yield, bill-of-materials accuracy.
   - Synchronized Planning: aligning demand, supply, capacity and financial plans across the network. Typical topics: demand sensing, S&OP and integrated business planning, multi-echelon inventory, scenario simulation. Typical measures: forecast accuracy, plan adherence, inventory turns.
   - Intelligent Supply: strategic sourcing and supplier management at the lowest total cost of ownership and acceptable risk. Typical topics: supplier selection and segmentation, spend analytics, contract management, supplier risk monitoring, should-cost models. Typical measures: supplier on-time delivery, cost reduction, supplier defect rate.
   - Smart Operations: real-time execution of production with embedded quality and safety. Typical topics: MES, shop-floor digital twins, equipment effectiveness, quality at source, operator assistance. Typical measures: OEE, first-pass quality, MTBF, schedule attainment.
   - Dynamic Fulfillment: multi-modal logistics that bring the right product to the right node at the right time. Typical topics: order orchestration, transportation optimisation, dynamic inventory allocation, warehouse execution, shipment visibility, reverse flows. Typical measures: fill rate, OTIF, cost per unit shipped.

2. SCOR process. The primary process addressed, one of:
   - Plan: demand and supply planning, balancing resources, strategy.
   - Source: procurement, supplier selection, receiving goods.
   - Make: production, manufacturing, assembly, maintenance.
   - Deliver: order management, warehousing, transportation, installation.
   - Return: reverse logistics, returns, repair, overhaul.
   - Enable: business rules, performance, data, risk and compliance management.

3. SCRM area. When the paper deals with supply chain risk management, the kind of risk:
   - Supply Risk: disruptions, supplier failure, material shortages.
   - Demand Risk: volatility, forecast errors, panic buying.
   - Operational Risk: breakdowns, internal process failures, strikes.
   - Cyber/Information Risk: data breaches, IT outages, digital security.
   - Sustainability/Regulatory Risk: compliance, environmental impact.
   - None: the paper is about optimisation or efficiency with no risk focus.

4. Problem description. One sentence naming the supply chain problem or pain point the paper addresses.

5. AI technology and agentic nature. Name the specific model or technique (for example deep reinforcement learning, transformer, genetic algorithm, SVM). State whether the paper explicitly describes an agent, autonomous agent or multi-agent system that perceives and acts without human intervention, and if so what the agent does (for example "negotiates with suppliers" or "reroutes trucks in real time").

6. Industry sector. The industry of the case study (for example automotive, pharmaceutical, fashion, aerospace). For reviews or purely theoretical work with no specific application, answer "General".

Answer with a single valid JSON object matching the Dimensions schema."#;

/// Built-in evaluator system prompt
pub const EVALUATOR_SYSTEM_PROMPT: &str = r#"You are an expert evaluator in structured supply chain research.

You compare a JSON document produced by an extraction model against a gold reference document for the same paper, and you judge how accurately each extracted dimension captures the paper in the context of agentic AI in supply chains.

For every field present in the evaluated document:
- give a score between 0 and 1, where 1 means the field fully agrees with the reference;
- add subdimension scores (for example semantic, factual, completeness) only when they help explain the score;
- add notes explaining your reasoning whenever the score is below 1.

Answer with valid JSON matching the EvaluationResult schema."#;

/// Builds the user prompt for dimension extraction
///
/// The prompt is the instructions followed by the full ordered chunk
/// sequence, serialized as JSON.
pub struct ExtractionPromptBuilder<'a> {
    instructions: &'a str,
    chunks: &'a [Chunk],
}

impl<'a> ExtractionPromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(instructions: &'a str, chunks: &'a [Chunk]) -> Self {
        Self {
            instructions,
            chunks,
        }
    }

    /// Build the user prompt
    pub fn build(&self) -> String {
        // A slice of plain structs always serializes
        let chunks = serde_json::to_string(self.chunks).unwrap_or_else(|_| "[]".to_string());
        format!("{}\n\n{}", self.instructions.trim_end(), chunks)
    }
}

/// Builds the user prompt for evaluating a predicted record
pub struct EvaluationPromptBuilder<'a> {
    predicted: &'a ExtractionRecord,
    gold: &'a ExtractionRecord,
}

impl<'a> EvaluationPromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(predicted: &'a ExtractionRecord, gold: &'a ExtractionRecord) -> Self {
        Self { predicted, gold }
    }

    /// Build the user prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();
        prompt.push_str("Document to be evaluated:\n");
        prompt.push_str(&to_pretty_json(self.predicted));
        prompt.push_str("\n\nGold reference:\n");
        prompt.push_str(&to_pretty_json(self.gold));
        prompt.push('\n');
        prompt
    }
}

fn to_pretty_json(record: &ExtractionRecord) -> String {
    serde_json::to_string_pretty(record).unwrap_or_default()
}
