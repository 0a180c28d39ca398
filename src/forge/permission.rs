//! forge::permission
//!
//! Permission resolution for providers with no "my permission" endpoint.
//!
//! # Design
//!
//! A [`Cascade`] is an ordered list of [`Probe`]s. Each probe issues one
//! transport call and reports a tagged [`ProbeOutcome`]:
//!
//! - `TerminalNegative`: the principal has no access; stop and return
//!   no permission.
//! - `ProvisionalPositive(level)`: the principal holds at least `level`.
//! - `Inconclusive`: this probe rules nothing in; try the next one.
//!
//! Hard errors (transport failures, rate limiting, cancellation) abort the
//! cascade and propagate. Only access denials (not-found and
//! permission-denied) are read as evidence.
//!
//! Probes are issued strictly in order. A probe whose ceiling cannot raise
//! the level already established is skipped without a transport call.
//!
//! # Example
//!
//! ```ignore
//! let level = Cascade::new()
//!     .probe(RepoVisible { .. })
//!     .probe(HooksReadable { .. })
//!     .probe(WritableListing { .. })
//!     .resolve(ctx)
//!     .await?;
//! ```

use std::future::Future;

use async_trait::async_trait;
use tracing::{debug, debug_span, trace, Instrument};

use super::context::Context;
use super::traits::{Response, ScmError, ScmResult};
use crate::core::types::{CollaboratorGrant, Perm, PermissionLevel};

/// Tagged result of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    TerminalNegative,
    ProvisionalPositive(PermissionLevel),
    Inconclusive,
}

/// What a probe observed, plus the transport metadata when it got a 2xx.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub outcome: ProbeOutcome,
    pub response: Option<Response>,
}

impl ProbeReport {
    pub fn new(outcome: ProbeOutcome, response: Option<Response>) -> Self {
        Self { outcome, response }
    }

    /// Read a call whose success alone proves `granted`.
    ///
    /// Access denials become `on_denial`; every other error propagates.
    pub fn gate(
        result: Result<Response, ScmError>,
        granted: PermissionLevel,
        on_denial: ProbeOutcome,
    ) -> Result<Self, ScmError> {
        match result {
            Ok(response) => Ok(Self::new(
                ProbeOutcome::ProvisionalPositive(granted),
                Some(response),
            )),
            Err(err) if err.is_access_denial() => {
                trace!(error = %err, "access denial read as evidence");
                Ok(Self::new(on_denial, None))
            }
            Err(err) => Err(err),
        }
    }
}

/// One step of a permission cascade.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Highest level a positive outcome of this probe can establish.
    fn ceiling(&self) -> PermissionLevel;

    async fn run(&self, ctx: &Context) -> Result<ProbeReport, ScmError>;
}

/// How a provider tells Write from Admin once a write-gated probe succeeds.
///
/// Providers differ here, so the rule is chosen per adapter rather than
/// baked into the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminRule {
    /// The write-gated probe is itself admin-gated; success means Admin.
    #[default]
    WebhookImpliesAdmin,
    /// Success means Write; a separate admin-gated probe decides Admin.
    SeparateAdminProbe,
}

impl AdminRule {
    /// Level granted by a successful webhook probe under this rule.
    pub fn webhook_grants(self) -> PermissionLevel {
        match self {
            AdminRule::WebhookImpliesAdmin => PermissionLevel::Admin,
            AdminRule::SeparateAdminProbe => PermissionLevel::Write,
        }
    }

    pub fn needs_admin_probe(self) -> bool {
        self == AdminRule::SeparateAdminProbe
    }
}

/// Result of running a cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub level: PermissionLevel,
    /// Metadata of the last successful transport call
    pub response: Response,
    /// Number of probes that issued a transport call
    pub probes_run: usize,
}

impl Resolution {
    pub fn perm(&self) -> Perm {
        Perm::from_level(self.level)
    }
}

/// Ordered permission probes.
#[derive(Default)]
pub struct Cascade<'a> {
    probes: Vec<Box<dyn Probe + 'a>>,
}

impl<'a> Cascade<'a> {
    pub fn new() -> Self {
        Self { probes: Vec::new() }
    }

    pub fn probe(mut self, probe: impl Probe + 'a) -> Self {
        self.probes.push(Box::new(probe));
        self
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Run the probes in order and combine their outcomes.
    ///
    /// # Errors
    ///
    /// Returns the first hard error, or `ScmError::Canceled` if `ctx` is
    /// cancelled before or during a probe.
    pub async fn resolve(&self, ctx: &Context) -> Result<Resolution, ScmError> {
        let span = debug_span!("permission_cascade", probes = self.probes.len());
        async move {
            let mut level = PermissionLevel::None;
            let mut response = Response::default();
            let mut probes_run = 0;

            for probe in &self.probes {
                if probe.ceiling() <= level {
                    trace!(probe = probe.name(), %level, "skipping probe");
                    continue;
                }

                ctx.check()?;
                probes_run += 1;
                let report = match probe.run(ctx).await {
                    Ok(report) => report,
                    Err(err) => {
                        debug!(probe = probe.name(), error = %err, "probe failed");
                        return Err(err);
                    }
                };
                if let Some(r) = report.response {
                    response = r;
                }

                match report.outcome {
                    ProbeOutcome::TerminalNegative => {
                        debug!(probe = probe.name(), "no access");
                        return Ok(Resolution {
                            level: PermissionLevel::None,
                            response,
                            probes_run,
                        });
                    }
                    ProbeOutcome::ProvisionalPositive(granted) => {
                        debug!(probe = probe.name(), %granted, "probe succeeded");
                        level = level.max(granted);
                    }
                    ProbeOutcome::Inconclusive => {
                        debug!(probe = probe.name(), "probe inconclusive");
                    }
                }
            }

            Ok(Resolution {
                level,
                response,
                probes_run,
            })
        }
        .instrument(span)
        .await
    }
}

/// Resolve the principal's current level, then grant `desired` only when
/// it is not already held.
///
/// Exactly one grant call is issued when the current level is lower.
pub async fn grant_if_missing<R, G, GF>(
    resolve: R,
    desired: PermissionLevel,
    grant: G,
) -> ScmResult<CollaboratorGrant>
where
    R: Future<Output = ScmResult<PermissionLevel>>,
    G: FnOnce() -> GF,
    GF: Future<Output = ScmResult<()>>,
{
    let (current, response) = resolve.await?;
    if current >= desired {
        debug!(%current, %desired, "permission already held");
        return Ok((
            CollaboratorGrant {
                granted: false,
                already_present: true,
            },
            response,
        ));
    }

    debug!(%current, %desired, "granting permission");
    let ((), response) = grant().await?;
    Ok((
        CollaboratorGrant {
            granted: true,
            already_present: false,
        },
        response,
    ))
}
