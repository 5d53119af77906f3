//! Turning sampled fields into validated persona records.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Utc};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::record::{PersonaFields, PersonaRecord};
use crate::error::{Error, Result};
use crate::sampling::{PersonaSampler, SampleRequest, SampledPersona};
use crate::summary::{fallback_summary, SummaryGenerator};

/// Builds persona records and attaches summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonaAssembler {
    reference_year: i32,
}

impl Default for PersonaAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl PersonaAssembler {
    /// Birth years are computed against the current calendar year.
    pub fn new() -> Self {
        Self {
            reference_year: Utc::now().year(),
        }
    }

    pub fn with_reference_year(reference_year: i32) -> Self {
        Self { reference_year }
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    /// Build the record in one step, validating its invariants.
    pub fn assemble(&self, sampled: SampledPersona) -> Result<PersonaRecord> {
        let birth_year = self.reference_year - sampled.age as i32;
        PersonaRecord::new(PersonaFields {
            id: sampled.id,
            seed: sampled.seed,
            first_name: sampled.first_name,
            last_name: sampled.last_name,
            gender: sampled.gender,
            age: sampled.age,
            birth_year,
            canton: sampled.canton,
            canton_name: sampled.canton_name,
            city: sampled.city,
            language: sampled.language,
            years_experience: sampled.years_experience,
            seniority: sampled.seniority,
            industry: sampled.industry,
            occupation: sampled.occupation,
            employer: sampled.employer,
            email: sampled.email,
            phone: sampled.phone,
        })
    }

    /// Attach a generated summary, or the template text if generation fails
    /// or exceeds `timeout`. Never fails.
    pub async fn attach_summary(
        &self,
        persona: PersonaRecord,
        generator: &dyn SummaryGenerator,
        timeout: Duration,
    ) -> PersonaRecord {
        if persona.summary().is_some() {
            return persona;
        }

        let outcome = match tokio::time::timeout(timeout, generator.generate(&persona)).await {
            Ok(result) => result,
            Err(_) => Err(Error::SummaryGeneration(format!(
                "{} did not answer within {}s",
                generator.name(),
                timeout.as_secs_f32()
            ))),
        };

        let summary = match outcome {
            Ok(text) => {
                debug!(persona = %persona.id(), backend = generator.name(), "Summary attached");
                text
            }
            Err(e) => {
                warn!(
                    persona = %persona.id(),
                    seed = persona.seed(),
                    error = %e.format_for_log(),
                    "Summary generation failed, using template text"
                );
                fallback_summary(&persona)
            }
        };

        persona.into_summarized(summary)
    }

    /// Attach summaries to many personas with at most `concurrency` calls in
    /// flight. Order is preserved.
    pub async fn attach_summaries(
        &self,
        personas: Vec<PersonaRecord>,
        generator: Arc<dyn SummaryGenerator>,
        timeout: Duration,
        concurrency: usize,
    ) -> Vec<PersonaRecord> {
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut tasks = JoinSet::new();
        // Kept for slots whose task panicked or was cancelled
        let originals = personas.clone();

        for (index, persona) in personas.into_iter().enumerate() {
            let assembler = *self;
            let generator = Arc::clone(&generator);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let persona = assembler
                    .attach_summary(persona, generator.as_ref(), timeout)
                    .await;
                (index, persona)
            });
        }

        let mut slots: Vec<Option<PersonaRecord>> = vec![None; originals.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, persona)) => slots[index] = Some(persona),
                Err(e) => warn!(error = %e, "Summary task did not complete, using template text"),
            }
        }

        slots
            .into_iter()
            .zip(originals)
            .map(|(slot, original)| {
                slot.unwrap_or_else(|| match original.summary() {
                    Some(_) => original,
                    None => {
                        let summary = fallback_summary(&original);
                        original.into_summarized(summary)
                    }
                })
            })
            .collect()
    }
}

/// Sampler plus assembler: seeds in, validated personas out.
#[derive(Debug, Clone)]
pub struct PersonaGenerator {
    sampler: PersonaSampler,
    assembler: PersonaAssembler,
}

impl PersonaGenerator {
    pub fn new(sampler: PersonaSampler) -> Self {
        Self {
            sampler,
            assembler: PersonaAssembler::new(),
        }
    }

    pub fn with_assembler(mut self, assembler: PersonaAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn sampler(&self) -> &PersonaSampler {
        &self.sampler
    }

    pub fn assembler(&self) -> &PersonaAssembler {
        &self.assembler
    }

    /// One persona for `request.seed`.
    pub fn generate(&self, request: &SampleRequest) -> Result<PersonaRecord> {
        let sampled = self.sampler.sample(request)?;
        self.assembler.assemble(sampled)
    }

    /// `count` personas seeded `base.seed + i` (wrapping).
    ///
    /// With `jobs > 1` the seeds are split into contiguous chunks across
    /// scoped threads; the result is identical to the sequential run.
    /// `jobs == 0` uses one thread per CPU. Personas that fail validation
    /// are logged and skipped; data errors abort the batch.
    pub fn generate_batch(
        &self,
        base: &SampleRequest,
        count: usize,
        jobs: usize,
    ) -> Result<Vec<PersonaRecord>> {
        let seeds: Vec<u64> = (0..count as u64)
            .map(|i| base.seed.wrapping_add(i))
            .collect();
        let jobs = effective_jobs(jobs, count);

        let results: Vec<Result<PersonaRecord>> = if jobs <= 1 {
            seeds
                .iter()
                .map(|seed| self.generate(&base.reseeded(*seed)))
                .collect()
        } else {
            let chunk_size = count.div_ceil(jobs);
            let chunks = std::thread::scope(|scope| {
                let handles: Vec<_> = seeds
                    .chunks(chunk_size)
                    .map(|chunk| {
                        scope.spawn(move || {
                            chunk
                                .iter()
                                .map(|seed| self.generate(&base.reseeded(*seed)))
                                .collect::<Vec<_>>()
                        })
                    })
                    .collect();

                handles
                    .into_iter()
                    .map(|handle| {
                        handle
                            .join()
                            .map_err(|_| Error::Internal("persona worker panicked".to_string()))
                    })
                    .collect::<Result<Vec<_>>>()
            })?;
            chunks.into_iter().flatten().collect()
        };

        let mut personas = Vec::with_capacity(count);
        for (seed, result) in seeds.iter().zip(results) {
            match result {
                Ok(persona) => personas.push(persona),
                Err(e) if e.aborts_batch() => return Err(e),
                Err(e) => {
                    warn!(seed, error = %e.format_for_log(), "Skipping persona");
                }
            }
        }

        info!(
            requested = count,
            generated = personas.len(),
            base_seed = base.seed,
            jobs,
            "Persona batch generated"
        );
        Ok(personas)
    }
}

/// Thread count for a batch of `count`.
fn effective_jobs(requested: usize, count: usize) -> usize {
    let jobs = if requested == 0 {
        num_cpus::get()
    } else {
        requested
    };
    jobs.clamp(1, count.max(1))
}
