//! The pipeline controller - runs every stage in order over one run context.

use knowledge_store::AtomSpace;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{PipelineConfig, FILTERED_OUT_FILE};
use crate::embedding::{CommandEmbedder, EmbeddingGenerator, EmbeddingRequest};
use crate::error::PipelineError;
use crate::export::{export_all, ExportSummary};
use crate::inference::{derive_attraction, infer_patient_subsets, infer_property_subsets};
use crate::loader::populate;
use crate::preprocess::{filter_patients, remove_vacuous_evaluations};
use crate::reasoner::{CommandReasoner, InertReasoner, Reasoner};
use crate::statistics::{
    calculate_truth_values, prune_subsets, prune_vacuous_subsets, TruthValueReport,
};

/// Everything a run works on, passed explicitly to each stage.
pub struct RunContext {
    pub config: PipelineConfig,
    pub output_dir: PathBuf,
    pub store: AtomSpace,
}

impl RunContext {
    pub fn new(config: PipelineConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
            store: AtomSpace::new(),
        }
    }

    pub fn output_file(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }
}

/// What a completed run did.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub output_dir: PathBuf,
    pub loaded_atoms: usize,
    pub vacuous_removed: usize,
    pub patients_removed: Vec<String>,
    pub total_patients: usize,
    pub subset_atoms_derived: usize,
    pub truth_values: TruthValueReport,
    pub pruned: usize,
    pub attraction_atoms_derived: usize,
    pub exported: ExportSummary,
}

/// The cohort reasoning pipeline.
pub struct Pipeline {
    ctx: RunContext,
    reasoner: Box<dyn Reasoner>,
    embedder: Option<Box<dyn EmbeddingGenerator>>,
}

impl Pipeline {
    /// Create a pipeline with an explicit reasoner and no embedder.
    pub fn new(ctx: RunContext, reasoner: Box<dyn Reasoner>) -> Self {
        Self {
            ctx,
            reasoner,
            embedder: None,
        }
    }

    /// Create a pipeline whose collaborators come from the configuration.
    ///
    /// A reasoning engine command is required unless the configuration asks
    /// for a dry run.
    pub fn from_config(
        config: PipelineConfig,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, PipelineError> {
        let reasoner: Box<dyn Reasoner> = if config.dry_run {
            Box::new(InertReasoner)
        } else {
            let engine = CommandReasoner::from_command(&config.reasoner.command)
                .ok_or(PipelineError::NoReasoner)?;
            Box::new(engine)
        };
        let embedder = CommandEmbedder::from_command(&config.embedding.command)
            .map(|e| Box::new(e) as Box<dyn EmbeddingGenerator>);

        let mut pipeline = Self::new(RunContext::new(config, output_dir), reasoner);
        pipeline.embedder = embedder;
        Ok(pipeline)
    }

    /// Set the embedding generator run at the end.
    pub fn with_embedder(mut self, embedder: Box<dyn EmbeddingGenerator>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn store(&self) -> &AtomSpace {
        &self.ctx.store
    }

    /// Run every stage once, in order.
    pub fn run(&mut self) -> Result<RunSummary, PipelineError> {
        let ctx = &mut self.ctx;
        let reasoner = self.reasoner.as_mut();

        fs::create_dir_all(&ctx.output_dir).map_err(|e| PipelineError::io(&ctx.output_dir, e))?;
        let rules_dir: &Path = &ctx.config.rules_dir;

        let mut summary = RunSummary {
            output_dir: ctx.output_dir.clone(),
            ..RunSummary::default()
        };

        summary.loaded_atoms = populate(&mut ctx.store, &ctx.config.data_path)?;

        info!("--- Preprocessing");
        summary.vacuous_removed = remove_vacuous_evaluations(&mut ctx.store)?;
        let filter = filter_patients(&mut ctx.store, &ctx.output_dir.join(FILTERED_OUT_FILE))?;
        summary.total_patients = filter.total.get();
        summary.patients_removed = filter.removed;

        summary.subset_atoms_derived =
            infer_patient_subsets(reasoner, &mut ctx.store, rules_dir)?;
        summary.subset_atoms_derived +=
            infer_property_subsets(reasoner, &mut ctx.store, rules_dir)?;

        summary.truth_values = calculate_truth_values(&mut ctx.store, filter.total);
        summary.pruned = prune_subsets(&mut ctx.store)?;
        if ctx.config.prune_vacuous_subsets {
            summary.pruned += prune_vacuous_subsets(&mut ctx.store)?;
        }

        summary.attraction_atoms_derived = derive_attraction(reasoner, &mut ctx.store, rules_dir)?;

        summary.exported = export_all(&ctx.store, &ctx.output_dir)?;

        match self.embedder.as_mut() {
            Some(embedder) => {
                let request = EmbeddingRequest {
                    algorithm: &ctx.config.embedding.algorithm,
                    output_dir: &ctx.output_dir,
                    entity_type: &ctx.config.embedding.entity_type,
                };
                embedder.generate(&request, &ctx.store)?;
            }
            None => info!("no embedding generator configured; skipping embeddings"),
        }

        Ok(summary)
    }
}
