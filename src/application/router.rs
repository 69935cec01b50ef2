//! # Router
//!
//! On-demand best-route search over the implicit graph of cached edges.
//!
//! Nodes are tokens; edges are the live quotes in the edge cache, loaded
//! lazily per pair as the search explores. The search considers direct
//! routes, two-hop routes through each candidate intermediate, and
//! three-hop routes through each ordered pair drawn from the first two
//! intermediates; leg loads within a hop level run concurrently.
//!
//! Failure semantics: any internal error is contained. The router logs
//! and answers "no route" rather than surfacing a 500 during a cache or
//! provider outage. The best-so-far candidate is request-local state,
//! never shared.

use crate::domain::entities::{EdgeQuote, Route, RouteStep};
use crate::domain::errors::DomainResult;
use crate::domain::value_objects::{Amount, Token};
use crate::infrastructure::cache::EdgeCache;
use crate::infrastructure::clock::Clock;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error};

/// Intermediate tokens tried when the caller names none.
pub const DEFAULT_INTERMEDIATES: [&str; 3] = ["USDC", "USDT", "EURC"];

/// Outcome of a route search.
#[derive(Debug, Clone, Default)]
pub struct RouteSearch {
    /// The best route, when one is reachable.
    pub route: Option<Route>,
    /// Runner-up route, offered to execution as the fallback.
    pub fallback: Option<Route>,
    /// Edge quotes backing the winning route, for settlement scoring.
    pub route_quotes: Vec<EdgeQuote>,
    /// Number of quotes examined across the search.
    pub considered_quotes: usize,
}

/// A candidate assembled during the search.
#[derive(Debug, Clone)]
struct Candidate {
    route: Route,
    quotes: Vec<EdgeQuote>,
}

/// Best-route finder over the edge cache.
#[derive(Debug, Clone)]
pub struct Router {
    cache: Arc<EdgeCache>,
    clock: Arc<dyn Clock>,
    default_intermediates: Vec<Token>,
}

impl Router {
    /// Creates a router with the standard stablecoin intermediates.
    #[must_use]
    pub fn new(cache: Arc<EdgeCache>, clock: Arc<dyn Clock>) -> Self {
        let default_intermediates = DEFAULT_INTERMEDIATES
            .iter()
            .filter_map(|s| Token::new(s).ok())
            .collect();
        Self {
            cache,
            clock,
            default_intermediates,
        }
    }

    /// Overrides the default intermediate set.
    #[must_use]
    pub fn with_default_intermediates(mut self, intermediates: Vec<Token>) -> Self {
        self.default_intermediates = intermediates;
        self
    }

    /// Finds the best route for `amount_in` of `from` into `to`.
    ///
    /// `intermediates` narrows the candidate mid tokens; empty means the
    /// configured defaults. `min_expiry_ms` drops quotes that would die
    /// within the window.
    ///
    /// Never fails: internal errors are logged and collapse to an empty
    /// search result.
    pub async fn best_route(
        &self,
        amount_in: Amount,
        from: &Token,
        to: &Token,
        intermediates: &[Token],
        min_expiry_ms: i64,
    ) -> RouteSearch {
        match self
            .search(amount_in, from, to, intermediates, min_expiry_ms)
            .await
        {
            Ok(search) => search,
            Err(e) => {
                error!(%from, %to, error = %e, "route search failed, returning no route");
                RouteSearch::default()
            }
        }
    }

    async fn search(
        &self,
        amount_in: Amount,
        from: &Token,
        to: &Token,
        intermediates: &[Token],
        min_expiry_ms: i64,
    ) -> DomainResult<RouteSearch> {
        let mids: Vec<Token> = if intermediates.is_empty() {
            self.default_intermediates.clone()
        } else {
            intermediates.to_vec()
        };
        let mids: Vec<Token> = mids
            .into_iter()
            .filter(|mid| mid != from && mid != to)
            .collect();

        let mut considered = 0usize;
        let mut candidates: Vec<Candidate> = Vec::new();

        // 1-hop: direct edges.
        let direct = self.load_edges(from, to, min_expiry_ms).await;
        considered += direct.len();
        for edge in &direct {
            if let Some(candidate) = self.assemble(amount_in, &[edge.clone()])? {
                candidates.push(candidate);
            }
        }

        // 2-hop: through each candidate intermediate, both legs loaded
        // concurrently.
        let two_hop_loads = mids.iter().map(|mid| async {
            let (first, second) = tokio::join!(
                self.load_edges(from, mid, min_expiry_ms),
                self.load_edges(mid, to, min_expiry_ms),
            );
            (first, second)
        });
        for (first_legs, second_legs) in join_all(two_hop_loads).await {
            considered += first_legs.len() + second_legs.len();
            for first in &first_legs {
                for second in &second_legs {
                    if let Some(candidate) =
                        self.assemble(amount_in, &[first.clone(), second.clone()])?
                    {
                        candidates.push(candidate);
                    }
                }
            }
        }

        // 3-hop: ordered pairs over the first two intermediates bound the
        // search.
        let three_hop_mids: Vec<&Token> = mids.iter().take(2).collect();
        let mut ordered_pairs = Vec::new();
        for m1 in &three_hop_mids {
            for m2 in &three_hop_mids {
                if m1 != m2 {
                    ordered_pairs.push((*m1, *m2));
                }
            }
        }
        let three_hop_loads = ordered_pairs.iter().map(|(m1, m2)| async {
            let (first, second, third) = tokio::join!(
                self.load_edges(from, m1, min_expiry_ms),
                self.load_edges(m1, m2, min_expiry_ms),
                self.load_edges(m2, to, min_expiry_ms),
            );
            (first, second, third)
        });
        for (first_legs, second_legs, third_legs) in join_all(three_hop_loads).await {
            considered += first_legs.len() + second_legs.len() + third_legs.len();
            for first in &first_legs {
                for second in &second_legs {
                    for third in &third_legs {
                        if let Some(candidate) = self.assemble(
                            amount_in,
                            &[first.clone(), second.clone(), third.clone()],
                        )? {
                            candidates.push(candidate);
                        }
                    }
                }
            }
        }

        // Rank by total output; first found wins ties.
        candidates.sort_by(|a, b| b.route.total_out.cmp(&a.route.total_out));
        let mut iter = candidates.into_iter();
        let best = iter.next();
        let fallback = iter.next().map(|c| c.route);

        debug!(
            %from,
            %to,
            considered,
            found = best.is_some(),
            "route search finished"
        );

        Ok(match best {
            Some(candidate) => RouteSearch {
                route: Some(candidate.route),
                fallback,
                route_quotes: candidate.quotes,
                considered_quotes: considered,
            },
            None => RouteSearch {
                considered_quotes: considered,
                ..RouteSearch::default()
            },
        })
    }

    /// Loads the live edges for a pair. Cache trouble reads as "no
    /// edges" so an outage degrades to an empty search.
    async fn load_edges(&self, from: &Token, to: &Token, min_expiry_ms: i64) -> Vec<EdgeQuote> {
        let now = self.clock.now();
        match self.cache.get_cached_by_pair(from, to).await {
            Ok(quotes) => quotes
                .into_iter()
                .filter(|q| q.is_live(now, min_expiry_ms))
                .collect(),
            Err(e) => {
                error!(%from, %to, error = %e, "edge load failed");
                Vec::new()
            }
        }
    }

    /// Chains `amount_in` through the given edges; None when a leg
    /// rejects the size or produces nothing.
    fn assemble(&self, amount_in: Amount, edges: &[EdgeQuote]) -> DomainResult<Option<Candidate>> {
        let mut steps = Vec::with_capacity(edges.len());
        let mut flowing = amount_in;
        for edge in edges {
            if !edge.accepts(flowing) {
                return Ok(None);
            }
            let out = edge.output_for(flowing)?;
            if !out.is_positive() {
                return Ok(None);
            }
            steps.push(RouteStep::new(
                edge.from_token.clone(),
                edge.to_token.clone(),
                edge.venue_id.clone(),
                flowing,
                out,
                edge.fee_bps,
            ));
            flowing = out;
        }
        let route = Route::from_steps(steps, self.clock.now())?;
        Ok(Some(Candidate {
            route,
            quotes: edges.to_vec(),
        }))
    }
}
