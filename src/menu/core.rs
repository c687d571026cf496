use crate::error::{Result, SelectError};
use crate::hash::{HashKey, OptionValue};
use crate::overlay::{CloseReason, OverlayCoordinator, OverlayHost, Scheduler, Wake};
use crate::selection::{ClickOutcome, OptionHandle, SelectionController, SharedOption};

/// Couples a selection controller with an overlay coordinator into one
/// widget-facing surface.
///
/// Click routing lives here: clicks are dropped until the overlay arms
/// interaction, a single-select commit closes the overlay, a backdrop
/// click cancels it. Selection semantics stay in the controller and
/// lifecycle semantics in the coordinator; this type only wires them.
pub struct SelectMenu {
    selection: SelectionController,
    overlay: OverlayCoordinator,
}

impl SelectMenu {
    pub fn new(selection: SelectionController, overlay: OverlayCoordinator) -> Self {
        Self { selection, overlay }
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionController {
        &mut self.selection
    }

    pub fn overlay(&self) -> &OverlayCoordinator {
        &self.overlay
    }

    /// Mount an option declared by the rendering layer. A missing value
    /// source is a caller error, reported before anything registers.
    pub fn mount_option(
        &mut self,
        value: Option<OptionValue>,
    ) -> Result<(HashKey, SharedOption)> {
        let value = value.ok_or(SelectError::MissingValueSource)?;
        let key = self.selection.hash(&value, None);
        let option = OptionHandle::new(value);
        self.selection.add_option(key.clone(), option.clone())?;
        Ok((key, option))
    }

    pub fn unmount_option(&mut self, key: &HashKey, option: &SharedOption) {
        self.selection.remove_option(key, option);
    }

    pub fn open(
        &mut self,
        host: &mut dyn OverlayHost,
        scheduler: &mut dyn Scheduler,
    ) -> Result<()> {
        self.overlay.show(host, scheduler)
    }

    pub fn cancel(&mut self, host: &mut dyn OverlayHost, scheduler: &mut dyn Scheduler) {
        self.overlay.cancel(host, scheduler);
    }

    pub fn wake(
        &mut self,
        wake: Wake,
        host: &mut dyn OverlayHost,
        scheduler: &mut dyn Scheduler,
    ) {
        self.overlay.wake(wake, host, scheduler);
    }

    /// Route a click on a mounted option. Returns `None` when the click
    /// is dropped: interaction not yet armed, or no such option.
    pub fn option_clicked(
        &mut self,
        key: &HashKey,
        host: &mut dyn OverlayHost,
        scheduler: &mut dyn Scheduler,
    ) -> Option<ClickOutcome> {
        if !self.overlay.interaction_active() {
            return None;
        }
        let option = self.selection.option(key)?;
        let outcome = self.selection.handle_click(key.clone(), option.value());
        // Any single-select click closes the menu, including an inert
        // re-click of the current selection.
        if matches!(outcome, ClickOutcome::Committed | ClickOutcome::Inert) {
            self.overlay.close(CloseReason::Committed, host, scheduler);
        }
        Some(outcome)
    }

    pub fn backdrop_clicked(
        &mut self,
        host: &mut dyn OverlayHost,
        scheduler: &mut dyn Scheduler,
    ) {
        if self.overlay.interaction_active() {
            self.overlay.close(CloseReason::BackdropClicked, host, scheduler);
        }
    }

    /// External-model change notification, forwarded to the controller.
    pub fn model_changed(&mut self) {
        self.selection.model_changed();
    }
}
