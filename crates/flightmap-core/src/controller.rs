//! One controller per mounted map.
//!
//! The host feeds it declarative data with [`RouteMapController::apply_data`]
//! and forwards engine events (`on_style_loaded`, `on_frame`). The controller
//! never awaits: coordinates it cannot answer from the cache come back as a
//! [`PendingResolution`] ticket for the host to resolve and hand back.
//!
//! Every render pass runs in this order: stop the animation, clear markers,
//! remove managed layers, resolve from cache, build arcs, add layers and
//! markers, fit the camera, restart the animation.

use crate::animation::{AnimationLoop, FrameToken, GlyphFrame, PlaneAnimator};
use crate::config::MapConfig;
use crate::geometry::{build_arcs, RouteArc};
use crate::layers::{LayerUpdate, MapLayerManager, StyleState};
use crate::map::{MapError, MapHandle};
use crate::markers::{airport_markers, hotel_markers, MarkerRegistry};
use crate::models::{resolve_segments, AirportMap, HotelPoint, RouteSegment, SegmentCodes};
use crate::resolver::{unique_codes, AirportCache, ResolveError};
use crate::view::{MapViewController, ViewPlan};

/// Codes the cache could not answer for one `apply_data` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingResolution {
    generation: u64,
    codes: Vec<String>,
}

impl PendingResolution {
    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What a render pass put on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    pub routes: usize,
    /// Segments left out because an endpoint is unresolved
    pub dropped: usize,
    pub markers: usize,
    /// Waiting for the style to load
    pub deferred: bool,
    pub animating: bool,
    pub view: Option<ViewPlan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    pub summary: RenderSummary,
    pub pending: Option<PendingResolution>,
}

pub struct RouteMapController<M: MapHandle, L: AnimationLoop> {
    map: M,
    frames: L,
    config: MapConfig,
    cache: AirportCache,
    markers: MarkerRegistry,
    layers: MapLayerManager,
    view: MapViewController,
    animator: PlaneAnimator,
    frame: Option<FrameToken>,
    segments: Vec<SegmentCodes>,
    hotels: Vec<HotelPoint>,
    resolved: Vec<RouteSegment>,
    arcs: Vec<RouteArc>,
    // Markers, camera and animation still owed once the style loads.
    deferred: bool,
    generation: u64,
    disposed: bool,
}

impl<M: MapHandle, L: AnimationLoop> RouteMapController<M, L> {
    pub fn new(map: M, frames: L, config: MapConfig, cache: AirportCache) -> Self {
        Self {
            layers: MapLayerManager::new(&config),
            view: MapViewController::new(&config),
            map,
            frames,
            config,
            cache,
            markers: MarkerRegistry::new(),
            animator: PlaneAnimator::new(),
            frame: None,
            segments: Vec::new(),
            hotels: Vec::new(),
            resolved: Vec::new(),
            arcs: Vec::new(),
            deferred: false,
            generation: 0,
            disposed: false,
        }
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    pub fn frames_mut(&mut self) -> &mut L {
        &mut self.frames
    }

    pub fn arcs(&self) -> &[RouteArc] {
        &self.arcs
    }

    pub fn resolved_segments(&self) -> &[RouteSegment] {
        &self.resolved
    }

    pub fn animator(&self) -> &PlaneAnimator {
        &self.animator
    }

    pub fn style_state(&self) -> StyleState {
        self.layers.state()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Replace the displayed routes and hotels.
    ///
    /// Segments whose airports are cached render right away. The returned
    /// ticket lists the codes still missing.
    pub fn apply_data(&mut self, segments: Vec<SegmentCodes>, hotels: Vec<HotelPoint>) -> ApplyOutcome {
        if self.disposed {
            return ApplyOutcome {
                summary: self.idle_summary(),
                pending: None,
            };
        }

        self.generation += 1;
        self.segments = segments;
        self.hotels = hotels;

        let summary = self.render();

        let codes = unique_codes(
            self.segments
                .iter()
                .flat_map(|segment| [segment.from.as_str(), segment.to.as_str()]),
        );
        let missing: Vec<String> = codes
            .into_iter()
            .filter(|code| !self.cache.contains(code))
            .collect();

        let pending = (!missing.is_empty()).then(|| PendingResolution {
            generation: self.generation,
            codes: missing,
        });

        ApplyOutcome { summary, pending }
    }

    /// Hand back the result of resolving a ticket.
    ///
    /// Stale tickets are ignored. A failed lookup leaves the cached-only
    /// rendering in place. Returns a summary when the map was redrawn.
    pub fn finish_resolution(
        &mut self,
        pending: PendingResolution,
        outcome: Result<AirportMap, ResolveError>,
    ) -> Option<RenderSummary> {
        if self.disposed || pending.generation != self.generation {
            tracing::debug!(
                "Discarding airport resolution for superseded update {}",
                pending.generation
            );
            return None;
        }

        let airports = match outcome {
            Ok(airports) => airports,
            Err(err) => {
                tracing::warn!("Airport lookup failed, showing cached airports only: {}", err);
                return None;
            }
        };

        self.cache.merge(airports.into_values());
        let resolved = resolve_segments(&self.segments, &self.cached_airports());
        if resolved == self.resolved {
            return None;
        }
        Some(self.render())
    }

    /// Forward the engine's style-loaded event.
    pub fn on_style_loaded(&mut self) -> Option<RenderSummary> {
        if self.disposed {
            return None;
        }

        let replay = self.layers.on_style_loaded(&mut self.map);
        if !self.deferred || self.layers.state() != StyleState::Ready {
            return None;
        }

        self.deferred = false;
        let routes = match replay {
            Some(LayerUpdate::Applied { routes }) => routes,
            _ => 0,
        };
        Some(self.finish_pass(routes))
    }

    /// Forward a frame delivered by the animation loop.
    ///
    /// Frames for a cancelled or superseded animation emit nothing.
    pub fn on_frame(&mut self, token: FrameToken) -> Option<GlyphFrame> {
        if self.disposed || self.frame != Some(token) {
            return None;
        }
        self.frame = None;

        let frame = self.animator.advance()?;
        if let Err(err) = self
            .layers
            .move_glyph(&mut self.map, frame.position, frame.bearing)
        {
            tracing::debug!("Failed to move plane glyph: {}", err);
        }
        self.frame = Some(self.frames.request_frame());
        Some(frame)
    }

    /// Re-fit the camera to what is currently shown.
    pub fn reset_view(&mut self) -> Option<ViewPlan> {
        if self.disposed {
            return None;
        }
        Some(self.view.fit_to_content(&mut self.map, &self.arcs, &self.hotels))
    }

    /// Ease to one of the displayed hotels. Returns false for an unknown id.
    pub fn focus_hotel(&mut self, hotel_id: &str) -> bool {
        if self.disposed {
            return false;
        }
        match self.hotels.iter().find(|hotel| hotel.id == hotel_id) {
            Some(hotel) => {
                self.view.focus_hotel(&mut self.map, hotel);
                true
            }
            None => false,
        }
    }

    /// Play the welcome-map camera move.
    pub fn intro_flight(&mut self) {
        if !self.disposed {
            self.view.intro_flight(&mut self.map);
        }
    }

    /// Swap the base style and redraw once it has loaded.
    pub fn change_style(&mut self, url: &str) -> Result<RenderSummary, MapError> {
        if self.disposed {
            return Err(MapError::Removed);
        }

        self.stop_animation();
        self.map.set_style(url)?;
        self.config.style_url = url.to_string();
        tracing::info!("Switching map style to {}", url);
        Ok(self.requeue_for_reload())
    }

    /// Forward an engine-initiated style swap. The current content is
    /// redrawn once the new style reports loaded.
    pub fn on_style_reloading(&mut self) -> Option<RenderSummary> {
        if self.disposed {
            return None;
        }
        Some(self.requeue_for_reload())
    }

    /// Tear down everything this controller put on the map.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }

        self.stop_animation();
        self.layers.cancel_pending(&mut self.map);
        self.markers.clear(&mut self.map);
        self.layers.remove_all_managed_layers(&mut self.map);
        self.deferred = false;
        self.disposed = true;
        tracing::debug!("Route map controller disposed");
    }

    fn requeue_for_reload(&mut self) -> RenderSummary {
        self.stop_animation();
        self.layers.begin_reload(&mut self.map);
        self.render()
    }

    fn render(&mut self) -> RenderSummary {
        self.stop_animation();
        self.markers.clear(&mut self.map);
        self.layers.remove_all_managed_layers(&mut self.map);

        self.resolved = resolve_segments(&self.segments, &self.cached_airports());
        self.arcs = match build_arcs(&self.resolved, self.config.arc_steps) {
            Ok(arcs) => arcs,
            Err(err) => {
                tracing::warn!("Cannot build route arcs: {}", err);
                Vec::new()
            }
        };

        match self
            .layers
            .replace_route_layers(&mut self.map, self.arcs.clone())
        {
            LayerUpdate::Applied { routes } => {
                self.deferred = false;
                self.finish_pass(routes)
            }
            LayerUpdate::Deferred => {
                self.deferred = true;
                tracing::debug!("Map style not loaded, deferring render pass");
                RenderSummary {
                    deferred: true,
                    ..self.idle_summary()
                }
            }
        }
    }

    fn finish_pass(&mut self, routes: usize) -> RenderSummary {
        let mut points = airport_markers(&self.resolved);
        points.extend(hotel_markers(&self.hotels));
        let markers = self.markers.set_markers(&mut self.map, points);

        let view = self.view.fit_to_content(&mut self.map, &self.arcs, &self.hotels);
        let animating = self.start_animation();

        let summary = RenderSummary {
            routes,
            dropped: self.segments.len() - self.resolved.len(),
            markers,
            deferred: false,
            animating,
            view: Some(view),
        };
        tracing::info!(
            "Rendered {} route(s) ({} unresolved), {} marker(s)",
            summary.routes,
            summary.dropped,
            summary.markers
        );
        summary
    }

    fn start_animation(&mut self) -> bool {
        let Some(start) = self.animator.start(self.arcs.clone()) else {
            return false;
        };
        if let Err(err) = self.layers.show_glyph(&mut self.map, start) {
            tracing::warn!("Cannot show plane glyph: {}", err);
            self.animator.cancel();
            return false;
        }
        self.frame = Some(self.frames.request_frame());
        true
    }

    fn stop_animation(&mut self) {
        self.animator.cancel();
        if let Some(token) = self.frame.take() {
            self.frames.cancel_frame(token);
        }
    }

    fn cached_airports(&self) -> AirportMap {
        let codes = unique_codes(
            self.segments
                .iter()
                .flat_map(|segment| [segment.from.as_str(), segment.to.as_str()]),
        );
        self.cache.get_many(&codes)
    }

    fn idle_summary(&self) -> RenderSummary {
        RenderSummary {
            routes: 0,
            dropped: 0,
            markers: 0,
            deferred: false,
            animating: false,
            view: None,
        }
    }
}

impl<M: MapHandle, L: AnimationLoop> Drop for RouteMapController<M, L> {
    fn drop(&mut self) {
        self.dispose();
    }
}
