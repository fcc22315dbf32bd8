use std::collections::BTreeSet;

use tracing::{debug, trace, warn};

use super::{
    placement, CascadeState, Direction, ItemAction, ItemEvent, Popup, PopupId, PopupItem,
};
use crate::command::CommandSink;
use crate::config::{FolderTrigger, SettingsProvider};
use crate::error::PopupError;
use crate::geometry::{Point, Rect};
use crate::monitor::MonitorProvider;
use crate::window::{PopupWindow, WindowId};

struct Slot {
    generation: u32,
    popup: Option<Popup>,
}

/// Arena owning every popup and driving their cascades
///
/// Popups refer to each other only through [`PopupId`]s resolved here, so a
/// released popup can never be reached through a stale owner or child link.
/// All transitions run synchronously on the caller's thread.
pub struct PopupTree<M, C> {
    slots: Vec<Slot>,
    free: Vec<u32>,
    monitors: M,
    commands: C,
}

impl<M: MonitorProvider, C: CommandSink> PopupTree<M, C> {
    pub fn new(monitors: M, commands: C) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            monitors,
            commands,
        }
    }

    pub fn monitors(&self) -> &M {
        &self.monitors
    }

    /// Swap in new monitor geometry; open popups re-layout on next show
    pub fn set_monitors(&mut self, monitors: M) {
        self.monitors = monitors;
        for popup in self.popups_mut() {
            popup.sized = false;
        }
    }

    pub fn commands(&self) -> &C {
        &self.commands
    }

    // === Storage ===

    pub fn insert(&mut self, popup: Popup) -> PopupId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.popup = Some(popup);
            return PopupId::new(index, slot.generation);
        }
        self.slots.push(Slot {
            generation: 0,
            popup: Some(popup),
        });
        PopupId::new(self.slots.len() as u32 - 1, 0)
    }

    /// Build a popup from the settings stored under `prefix` and insert it
    pub fn create(
        &mut self,
        title: &str,
        bang: Option<&str>,
        prefix: &str,
        settings: &dyn SettingsProvider,
        window: Box<dyn PopupWindow>,
    ) -> PopupId {
        let popup = Popup::new(
            title,
            bang.map(str::to_string),
            prefix,
            settings.popup_settings(prefix),
            window,
        );
        self.insert(popup)
    }

    pub fn get(&self, id: PopupId) -> Result<&Popup, PopupError> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.popup.as_ref())
            .ok_or(PopupError::UnknownPopup(id))
    }

    fn get_mut(&mut self, id: PopupId) -> Result<&mut Popup, PopupError> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.popup.as_mut())
            .ok_or(PopupError::UnknownPopup(id))
    }

    pub fn contains(&self, id: PopupId) -> bool {
        self.get(id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.popup.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> impl Iterator<Item = PopupId> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.popup
                .as_ref()
                .map(|_| PopupId::new(index as u32, slot.generation))
        })
    }

    fn popups_mut(&mut self) -> impl Iterator<Item = &mut Popup> + '_ {
        self.slots.iter_mut().filter_map(|slot| slot.popup.as_mut())
    }

    /// Popup backed by `window`, for routing window-system events
    pub fn popup_for_window(&self, window: WindowId) -> Option<PopupId> {
        self.ids()
            .find(|id| self.get(*id).map(|p| p.window_id() == window).unwrap_or(false))
    }

    /// Close and destroy a popup together with its items and window
    pub fn release(&mut self, id: PopupId) -> Result<(), PopupError> {
        let popup = self.get(id)?;
        if popup.is_visible() || popup.owner.is_some() || popup.open_child.is_some() {
            self.close(id)?;
        }

        let slot = &mut self.slots[id.index()];
        slot.popup = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index() as u32);
        debug!("released popup {:?}", id);
        Ok(())
    }

    /// Release `root` and every popup reachable through its folder items
    ///
    /// Returns how many popups were destroyed.
    pub fn release_hierarchy(&mut self, root: PopupId) -> Result<usize, PopupError> {
        let mut seen = BTreeSet::new();
        let mut pending = vec![root];
        while let Some(id) = pending.pop() {
            if !seen.insert(id) {
                continue;
            }
            let popup = self.get(id)?;
            pending.extend(popup.items.iter().filter_map(PopupItem::folder_popup));
        }

        let mut released = 0;
        for id in seen {
            if self.contains(id) {
                self.release(id)?;
                released += 1;
            }
        }
        Ok(released)
    }

    // === Items ===

    /// Append an item; a visible popup re-runs its layout right away
    pub fn add_item(&mut self, id: PopupId, mut item: PopupItem) -> Result<usize, PopupError> {
        let popup = self.get_mut(id)?;
        item.set_icon_visible(!popup.settings.no_icons);
        popup.items.push(item);
        popup.sized = false;
        let index = popup.items.len() - 1;
        self.relayout_if_visible(id)?;
        Ok(index)
    }

    pub fn remove_item(&mut self, id: PopupId, index: usize) -> Result<PopupItem, PopupError> {
        let popup = self.get(id)?;
        if index >= popup.items.len() {
            return Err(PopupError::UnknownItem { popup: id, index });
        }
        if popup.child_item == Some(index) {
            self.close_child(id, false)?;
        }

        let popup = self.get_mut(id)?;
        let item = popup.items.remove(index);
        if let Some(child_item) = popup.child_item.as_mut() {
            if *child_item > index {
                *child_item -= 1;
            }
        }
        popup.sized = false;
        self.relayout_if_visible(id)?;
        Ok(item)
    }

    fn relayout_if_visible(&mut self, id: PopupId) -> Result<(), PopupError> {
        let popup = self.get(id)?;
        if !popup.is_visible() {
            return Ok(());
        }
        let limits = placement::confinement(&popup.settings, &popup.window.frame(), &self.monitors)?;
        self.get_mut(id)?.size(limits.height())
    }

    /// Screen rectangle of an item, used to anchor the popup it opens
    pub fn item_screen_rect(&self, id: PopupId, index: usize) -> Result<Rect, PopupError> {
        let popup = self.get(id)?;
        let item = popup
            .items
            .get(index)
            .ok_or(PopupError::UnknownItem { popup: id, index })?;
        let origin = popup.window.position();
        let position = item.position();
        Ok(Rect::from_xywh(
            origin.x + position.x,
            origin.y + position.y,
            item.width(),
            item.height(),
        ))
    }

    // === Showing ===

    /// Show a popup next to `anchor`, owned by `owner` when it is nested
    pub fn show(
        &mut self,
        id: PopupId,
        anchor: Rect,
        owner: Option<PopupId>,
    ) -> Result<(), PopupError> {
        let popup = self.get(id)?;
        let limits = placement::confinement(&popup.settings, &anchor, &self.monitors)?;

        // Everything fallible runs before any link changes
        let popup = self.get_mut(id)?;
        if popup.needs_layout(limits.height()) {
            popup.size(limits.height())?;
        }

        if let Some(previous) = popup.owner.filter(|previous| Some(*previous) != owner) {
            self.detach_from_owner(previous, id)?;
        }

        let popup = self.get_mut(id)?;
        popup.owner = owner;

        let placed = placement::place(
            &anchor,
            popup.extent(),
            &limits,
            popup.expand_left,
            owner.is_some(),
        );
        popup.expand_left = placed.expand_left;

        popup.window.move_to(placed.x, placed.y);
        popup.window.show();
        popup.window.raise();
        popup.window.focus();
        debug!(
            "showing popup {:?} '{}' at ({}, {}) owner={:?} expand_left={}",
            id, popup.title, placed.x, placed.y, owner, placed.expand_left
        );
        Ok(())
    }

    /// Show a root popup at a point, typically the cursor
    pub fn show_at(&mut self, id: PopupId, point: Point) -> Result<(), PopupError> {
        self.show(id, Rect::around(point), None)
    }

    pub fn find_by_bang(&self, bang: &str) -> Option<PopupId> {
        self.ids().find(|id| {
            self.get(*id)
                .ok()
                .and_then(Popup::bang)
                .is_some_and(|b| b.eq_ignore_ascii_case(bang))
        })
    }

    /// Show the popup registered under `bang` at `point`
    ///
    /// Returns false when no popup answers to that bang.
    pub fn run_bang(&mut self, bang: &str, point: Point) -> Result<bool, PopupError> {
        match self.find_by_bang(bang) {
            Some(id) => {
                self.show_at(id, point)?;
                Ok(true)
            }
            None => {
                warn!("no popup registered for {}", bang);
                Ok(false)
            }
        }
    }

    // === Cascade ===

    pub fn state(&self, id: PopupId) -> Result<CascadeState, PopupError> {
        Ok(self.get(id)?.state())
    }

    fn is_ancestor(&self, candidate: PopupId, of: PopupId) -> Result<bool, PopupError> {
        let mut current = Some(of);
        while let Some(id) = current {
            if id == candidate {
                return Ok(true);
            }
            current = self.get(id)?.owner;
        }
        Ok(false)
    }

    /// Open `child` next to `rect`, invited by the folder item at `item`
    pub fn open_child(
        &mut self,
        parent: PopupId,
        child: PopupId,
        rect: Rect,
        item: usize,
    ) -> Result<(), PopupError> {
        let popup = self.get(parent)?;
        if popup.open_child == Some(child) {
            return Ok(());
        }
        if popup.items.get(item).is_none() {
            return Err(PopupError::UnknownItem {
                popup: parent,
                index: item,
            });
        }
        if self.is_ancestor(child, parent)? {
            return Err(PopupError::CascadeCycle { parent, child });
        }

        self.close_child(parent, false)?;
        if let Some(previous) = self.get(child)?.owner {
            self.close_child(previous, true)?;
        }

        let popup = self.get_mut(parent)?;
        popup.open_child = Some(child);
        popup.child_item = Some(item);
        popup.items[item].set_folder_open(true);
        let expand_left = popup.expand_left;
        let padding = popup.settings.padding;
        let (offset_x, offset_y) = (popup.settings.child_offset_x, popup.settings.child_offset_y);

        let anchor = Rect::new(
            rect.left - (padding.left + offset_x),
            rect.top - (padding.top + offset_y),
            rect.right + (padding.right + offset_x),
            rect.bottom + (padding.bottom + offset_y),
        );

        self.get_mut(child)?.expand_left = expand_left;
        debug!("popup {:?} opening child {:?}", parent, child);
        if let Err(err) = self.show(child, anchor, Some(parent)) {
            warn!("popup {:?} failed to open child {:?}: {}", parent, child, err);
            self.detach_from_owner(parent, child)?;
            let popup = self.get_mut(child)?;
            popup.owner = None;
            popup.expand_left = popup.settings.expand_left;
            return Err(err);
        }
        Ok(())
    }

    /// Close the open child of `id`
    ///
    /// `closing` is set when this runs inside a wider close cascade; focus is
    /// then left alone instead of bouncing back to `id`.
    pub fn close_child(&mut self, id: PopupId, closing: bool) -> Result<(), PopupError> {
        let popup = self.get_mut(id)?;
        let Some(child) = popup.open_child.take() else {
            return Ok(());
        };
        if !closing {
            popup.window.focus();
        }
        if let Some(item) = popup.child_item.take().and_then(|i| popup.items.get_mut(i)) {
            item.closing_popup();
        }

        self.get_mut(child)?.owner = None;
        trace!("popup {:?} closed child {:?} closing={}", id, child, closing);
        self.close(child)
    }

    /// Hide a popup, close its children and every popup it descends from
    pub fn close(&mut self, id: PopupId) -> Result<(), PopupError> {
        let mut current = Some(id);
        while let Some(id) = current {
            let popup = self.get_mut(id)?;
            popup.window.hide();
            popup.expand_left = popup.settings.expand_left;
            for item in &mut popup.items {
                item.reset_hover();
            }

            self.close_child(id, true)?;

            let popup = self.get_mut(id)?;
            popup.mouse_over = false;
            let owner = popup.owner.take();
            if let Some(owner) = owner {
                self.detach_from_owner(owner, id)?;
            }
            debug!("closed popup {:?}", id);
            current = owner;
        }
        Ok(())
    }

    fn detach_from_owner(&mut self, owner: PopupId, child: PopupId) -> Result<(), PopupError> {
        let owner = self.get_mut(owner)?;
        if owner.open_child != Some(child) {
            return Ok(());
        }
        owner.open_child = None;
        if let Some(item) = owner.child_item.take().and_then(|i| owner.items.get_mut(i)) {
            item.closing_popup();
        }
        Ok(())
    }

    // === Focus ===

    /// Whether `id` should stay open now that `active` has the focus
    pub fn check_focus(
        &self,
        id: PopupId,
        active: Option<WindowId>,
        direction: Direction,
    ) -> Result<bool, PopupError> {
        let popup = self.get(id)?;
        if active == Some(popup.window_id()) || popup.mouse_over {
            return Ok(true);
        }
        if direction.contains(Direction::OWNER) {
            if let Some(owner) = popup.owner {
                if self.check_focus(owner, active, Direction::OWNER)? {
                    return Ok(true);
                }
            }
        }
        if direction.contains(Direction::CHILD) {
            if let Some(child) = popup.open_child {
                if self.check_focus(child, active, Direction::CHILD)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// The window of `id` lost activation to `new_active`
    ///
    /// Closes the popup (and its ancestors) when focus left the cascade.
    /// Returns whether it closed.
    pub fn on_deactivate(
        &mut self,
        id: PopupId,
        new_active: Option<WindowId>,
    ) -> Result<bool, PopupError> {
        if !self.get(id)?.is_visible() {
            return Ok(false);
        }
        let stays_open = self.check_focus(id, new_active, Direction::all())?;
        trace!(
            "popup {:?} deactivated for {:?}, stays open: {}",
            id,
            new_active,
            stays_open
        );
        if !stays_open {
            self.close(id)?;
        }
        Ok(!stays_open)
    }

    pub fn pointer_moved(&mut self, id: PopupId) -> Result<(), PopupError> {
        self.get_mut(id)?.mouse_over = true;
        Ok(())
    }

    pub fn pointer_left(&mut self, id: PopupId) -> Result<(), PopupError> {
        self.get_mut(id)?.mouse_over = false;
        Ok(())
    }

    // === Items interaction ===

    /// Route pointer input to an item and carry out what it asks for
    pub fn item_event(
        &mut self,
        id: PopupId,
        index: usize,
        event: ItemEvent,
    ) -> Result<Option<ItemAction>, PopupError> {
        let popup = self.get(id)?;
        if index >= popup.items.len() {
            return Err(PopupError::UnknownItem { popup: id, index });
        }
        let trigger = popup.settings.folder_trigger;
        let close_on_command = popup.settings.close_on_command;

        // Hovering a sibling collapses the submenu opened by another folder
        if event == ItemEvent::PointerEnter
            && trigger == FolderTrigger::Hover
            && popup.open_child.is_some()
            && popup.child_item != Some(index)
            && popup.items[index].is_interactive()
        {
            self.close_child(id, false)?;
        }

        let action = self.get_mut(id)?.items[index].handle_event(event, trigger);
        match &action {
            Some(ItemAction::Execute(command)) => {
                if let Err(err) = self.commands.execute(command) {
                    warn!("failed to execute '{}': {}", command, err);
                }
                if close_on_command {
                    self.close(id)?;
                }
            }
            Some(ItemAction::OpenFolder(child)) => {
                let rect = self.item_screen_rect(id, index)?;
                self.open_child(id, *child, rect, index)?;
            }
            Some(ItemAction::CloseFolder(child)) => {
                if self.get(id)?.open_child == Some(*child) {
                    self.close_child(id, false)?;
                }
            }
            None => {}
        }
        Ok(action)
    }

    // === Settings ===

    /// Re-read every popup's settings; layouts are recomputed on next show
    pub fn reload_settings(&mut self, provider: &dyn SettingsProvider) {
        for popup in self.popups_mut() {
            let settings = provider.popup_settings(&popup.prefix);
            popup.apply_settings(settings);
        }
        debug!("reloaded popup settings");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::DryRunSink;
    use crate::config::PopupSettings;
    use crate::geometry::Padding;
    use crate::monitor::MonitorLayout;
    use crate::popup::HoverState;
    use crate::window::HeadlessDisplay;

    type Tree = PopupTree<MonitorLayout, DryRunSink>;

    fn tree() -> Tree {
        PopupTree::new(
            MonitorLayout::single(Rect::new(0, 0, 1920, 1080)),
            DryRunSink::new(),
        )
    }

    fn popup(tree: &mut Tree, display: &HeadlessDisplay, title: &str) -> PopupId {
        let window = Box::new(display.create_window(title));
        tree.create(title, None, title, &PopupSettings::default(), window)
    }

    /// root -> [Run, Games(folder), Quit]; games -> [Chess, More(folder)]; more -> [Go]
    fn cascade(tree: &mut Tree, display: &HeadlessDisplay) -> (PopupId, PopupId, PopupId) {
        let root = popup(tree, display, "root");
        let games = popup(tree, display, "games");
        let more = popup(tree, display, "more");
        tree.add_item(more, PopupItem::command("Go", "gnugo")).unwrap();
        tree.add_item(games, PopupItem::command("Chess", "gnome-chess")).unwrap();
        tree.add_item(games, PopupItem::folder("More", more)).unwrap();
        tree.add_item(root, PopupItem::command("Run", "krunner")).unwrap();
        tree.add_item(root, PopupItem::folder("Games", games)).unwrap();
        tree.add_item(root, PopupItem::command("Quit", "otto --quit")).unwrap();
        (root, games, more)
    }

    fn open_all(tree: &mut Tree, root: PopupId, games: PopupId) {
        tree.show_at(root, Point::new(100, 100)).unwrap();
        tree.item_event(root, 1, ItemEvent::PointerEnter).unwrap();
        tree.item_event(games, 1, ItemEvent::PointerEnter).unwrap();
    }

    #[test]
    fn show_sizes_and_focuses_popup() {
        let display = HeadlessDisplay::new();
        let mut tree = tree();
        let (root, _, _) = cascade(&mut tree, &display);

        tree.show_at(root, Point::new(100, 100)).unwrap();
        let p = tree.get(root).unwrap();
        assert!(p.is_sized());
        assert_eq!(p.state(), CascadeState::Open);
        assert_eq!(display.focused(), Some(p.window_id()));
        let snapshot = display.snapshot(p.window_id()).unwrap();
        assert_eq!(snapshot.size, (200, 5 + 22 * 3 + 2 * 2 + 5));
        assert_eq!(snapshot.position, Point::new(101, 99));
    }

    #[test]
    fn hovering_folder_opens_child_next_to_item() {
        let display = HeadlessDisplay::new();
        let mut tree = tree();
        let (root, games, _) = cascade(&mut tree, &display);
        tree.show_at(root, Point::new(100, 100)).unwrap();

        let action = tree.item_event(root, 1, ItemEvent::PointerEnter).unwrap();
        assert_eq!(action, Some(ItemAction::OpenFolder(games)));
        assert_eq!(tree.state(root).unwrap(), CascadeState::OpenWithChild);
        assert_eq!(tree.get(root).unwrap().child_item(), Some(1));
        assert_eq!(tree.get(games).unwrap().owner(), Some(root));
        assert!(tree.get(root).unwrap().item(1).unwrap().is_folder_open());

        // item rect: x 101+5..101+195, y 99+29; anchor grows by padding
        let snapshot = display.snapshot(tree.get(games).unwrap().window_id()).unwrap();
        assert_eq!(snapshot.position, Point::new(101 + 195 + 5, 99 + 29 - 5));
        assert_eq!(display.focused(), Some(tree.get(games).unwrap().window_id()));
    }

    #[test]
    fn open_child_twice_is_idempotent() {
        let display = HeadlessDisplay::new();
        let mut tree = tree();
        let (root, games, _) = cascade(&mut tree, &display);
        tree.show_at(root, Point::new(100, 100)).unwrap();

        let rect = tree.item_screen_rect(root, 1).unwrap();
        tree.open_child(root, games, rect, 1).unwrap();
        let games_window = tree.get(games).unwrap().window_id();
        let focus_requests = display.focus_requests();

        tree.open_child(root, games, rect, 1).unwrap();
        assert_eq!(display.focus_requests(), focus_requests);
        assert_eq!(display.snapshot(games_window).unwrap().show_count, 1);
        assert_eq!(tree.get(games).unwrap().owner(), Some(root));
    }

    #[test]
    fn close_hides_child_and_clears_link() {
        let display = HeadlessDisplay::new();
        let mut tree = tree();
        let (root, games, more) = cascade(&mut tree, &display);
        open_all(&mut tree, root, games);
        assert!(tree.get(more).unwrap().is_visible());

        tree.close(root).unwrap();
        for id in [root, games, more] {
            let p = tree.get(id).unwrap();
            assert!(!p.is_visible());
            assert_eq!(p.open_child(), None);
            assert_eq!(p.owner(), None);
        }
        assert!(!tree.get(root).unwrap().item(1).unwrap().is_folder_open());
    }

    #[test]
    fn closing_a_leaf_closes_every_ancestor() {
        let display = HeadlessDisplay::new();
        let mut tree = tree();
        let (root, games, more) = cascade(&mut tree, &display);
        open_all(&mut tree, root, games);

        tree.close(more).unwrap();
        for id in [root, games, more] {
            assert_eq!(tree.state(id).unwrap(), CascadeState::Closed);
        }
    }

    #[test]
    fn close_child_restores_focus_unless_closing() {
        let display = HeadlessDisplay::new();
        let mut tree = tree();
        let (root, games, _) = cascade(&mut tree, &display);
        open_all(&mut tree, root, games);
        let root_window = tree.get(root).unwrap().window_id();

        tree.close_child(root, false).unwrap();
        assert_eq!(display.focused(), Some(root_window));
        assert!(tree.get(root).unwrap().is_visible());

        open_all(&mut tree, root, games);
        display.set_focused(None);
        let requests = display.focus_requests();
        tree.close_child(root, true).unwrap();
        assert_eq!(display.focus_requests(), requests);
        assert_eq!(tree.state(root).unwrap(), CascadeState::Open);
    }

    #[test]
    fn focus_inside_cascade_keeps_it_open() {
        let display = HeadlessDisplay::new();
        let mut tree = tree();
        let (root, games, more) = cascade(&mut tree, &display);
        open_all(&mut tree, root, games);

        let more_window = tree.get(more).unwrap().window_id();
        let root_window = tree.get(root).unwrap().window_id();
        for id in [root, games, more] {
            let own = tree.get(id).unwrap().window_id();
            assert!(tree.check_focus(id, Some(own), Direction::all()).unwrap());
            assert!(tree.check_focus(id, Some(own), Direction::empty()).unwrap());
        }
        assert!(tree.check_focus(root, Some(more_window), Direction::all()).unwrap());
        assert!(!tree.check_focus(root, Some(more_window), Direction::OWNER).unwrap());
        assert!(tree.check_focus(more, Some(root_window), Direction::OWNER).unwrap());

        assert!(!tree.on_deactivate(games, Some(more_window)).unwrap());
        assert!(tree.get(games).unwrap().is_visible());
    }

    #[test]
    fn focus_leaving_cascade_closes_it() {
        let display = HeadlessDisplay::new();
        let mut tree = tree();
        let (root, games, more) = cascade(&mut tree, &display);
        open_all(&mut tree, root, games);

        assert!(tree.on_deactivate(more, Some(WindowId(999))).unwrap());
        for id in [root, games, more] {
            assert!(!tree.get(id).unwrap().is_visible());
        }
    }

    #[test]
    fn pointer_over_popup_keeps_it_open() {
        let display = HeadlessDisplay::new();
        let mut tree = tree();
        let (root, games, _) = cascade(&mut tree, &display);
        open_all(&mut tree, root, games);

        tree.pointer_moved(root).unwrap();
        assert!(!tree.on_deactivate(games, None).unwrap());
        tree.pointer_left(root).unwrap();
        assert!(tree.on_deactivate(games, None).unwrap());
        assert!(!tree.get(root).unwrap().is_mouse_over());
    }

    #[test]
    fn command_executes_and_closes_cascade() {
        let display = HeadlessDisplay::new();
        let mut tree = tree();
        let (root, games, more) = cascade(&mut tree, &display);
        open_all(&mut tree, root, games);

        tree.item_event(more, 0, ItemEvent::PointerEnter).unwrap();
        tree.item_event(more, 0, ItemEvent::ButtonDown).unwrap();
        let action = tree.item_event(more, 0, ItemEvent::ButtonUp).unwrap();

        assert_eq!(action, Some(ItemAction::Execute("gnugo".to_string())));
        assert_eq!(tree.commands().executed(), ["gnugo"]);
        assert_eq!(tree.state(root).unwrap(), CascadeState::Closed);
        assert_eq!(
            tree.get(more).unwrap().item(0).unwrap().hover_state(),
            HoverState::Normal
        );
        assert_eq!(
            tree.get(root).unwrap().item(1).unwrap().hover_state(),
            HoverState::Normal
        );
    }

    #[test]
    fn command_keeps_cascade_open_when_configured() {
        let display = HeadlessDisplay::new();
        let mut tree = tree();
        let settings = PopupSettings {
            close_on_command: false,
            ..PopupSettings::default()
        };
        let window = Box::new(display.create_window("tools"));
        let id = tree.create("tools", None, "tools", &settings, window);
        tree.add_item(id, PopupItem::command("Top", "htop")).unwrap();
        tree.show_at(id, Point::new(50, 50)).unwrap();

        for event in [ItemEvent::PointerEnter, ItemEvent::ButtonDown, ItemEvent::ButtonUp] {
            tree.item_event(id, 0, event).unwrap();
        }

        assert_eq!(tree.commands().executed(), ["htop"]);
        assert_eq!(tree.state(id).unwrap(), CascadeState::Open);
        assert_eq!(
            tree.get(id).unwrap().item(0).unwrap().hover_state(),
            HoverState::Hover
        );
    }

    #[test]
    fn failed_child_show_leaves_links_untouched() {
        let display = HeadlessDisplay::new();
        let mut tree = tree();
        let (root, games, _) = cascade(&mut tree, &display);
        tree.show_at(root, Point::new(100, 100)).unwrap();
        tree.set_monitors(MonitorLayout::default());

        let result = tree.item_event(root, 1, ItemEvent::PointerEnter);
        assert!(matches!(result, Err(PopupError::NoMonitor(_))));

        let p = tree.get(root).unwrap();
        assert_eq!(p.open_child(), None);
        assert_eq!(p.child_item(), None);
        assert_eq!(p.state(), CascadeState::Open);
        assert!(!p.item(1).unwrap().is_folder_open());
        let child = tree.get(games).unwrap();
        assert_eq!(child.owner(), None);
        assert!(!child.is_visible());

        tree.set_monitors(MonitorLayout::single(Rect::new(0, 0, 1920, 1080)));
        tree.item_event(root, 1, ItemEvent::PointerEnter).unwrap();
        assert_eq!(tree.get(games).unwrap().owner(), Some(root));
        assert_eq!(tree.state(root).unwrap(), CascadeState::OpenWithChild);
    }

    #[test]
    fn opening_a_child_owned_elsewhere_moves_it() {
        let display = HeadlessDisplay::new();
        let mut tree = tree();
        let shared = popup(&mut tree, &display, "shared");
        tree.add_item(shared, PopupItem::command("Edit", "gedit")).unwrap();
        let left = popup(&mut tree, &display, "left");
        let right = popup(&mut tree, &display, "right");
        tree.add_item(left, PopupItem::folder("Shared", shared)).unwrap();
        tree.add_item(right, PopupItem::folder("Shared", shared)).unwrap();

        tree.show_at(left, Point::new(100, 100)).unwrap();
        tree.item_event(left, 0, ItemEvent::PointerEnter).unwrap();
        assert_eq!(tree.get(shared).unwrap().owner(), Some(left));

        tree.show_at(right, Point::new(900, 100)).unwrap();
        let rect = tree.item_screen_rect(right, 0).unwrap();
        tree.open_child(right, shared, rect, 0).unwrap();

        let l = tree.get(left).unwrap();
        assert!(l.is_visible());
        assert_eq!(l.open_child(), None);
        assert_eq!(l.child_item(), None);
        assert!(!l.item(0).unwrap().is_folder_open());

        let r = tree.get(right).unwrap();
        assert_eq!(r.open_child(), Some(shared));
        assert!(r.item(0).unwrap().is_folder_open());
        let s = tree.get(shared).unwrap();
        assert_eq!(s.owner(), Some(right));
        assert!(s.is_visible());
    }

    #[test]
    fn hovering_sibling_closes_open_folder() {
        let display = HeadlessDisplay::new();
        let mut tree = tree();
        let (root, games, more) = cascade(&mut tree, &display);
        open_all(&mut tree, root, games);

        tree.item_event(root, 2, ItemEvent::PointerEnter).unwrap();
        assert_eq!(tree.state(root).unwrap(), CascadeState::Open);
        assert!(!tree.get(games).unwrap().is_visible());
        assert!(!tree.get(more).unwrap().is_visible());
    }

    #[test]
    fn expand_left_propagates_and_resets() {
        let display = HeadlessDisplay::new();
        let mut tree = tree();
        let (root, games, more) = cascade(&mut tree, &display);

        tree.show_at(root, Point::new(1850, 100)).unwrap();
        assert!(tree.get(root).unwrap().expand_left());
        let snapshot = display.snapshot(tree.get(root).unwrap().window_id()).unwrap();
        assert_eq!(snapshot.position.x, 1849 - 200);

        tree.item_event(root, 1, ItemEvent::PointerEnter).unwrap();
        tree.item_event(games, 1, ItemEvent::PointerEnter).unwrap();
        assert!(tree.get(games).unwrap().expand_left());
        assert!(tree.get(more).unwrap().expand_left());

        tree.close(root).unwrap();
        for id in [root, games, more] {
            assert!(!tree.get(id).unwrap().expand_left());
        }
    }

    #[test]
    fn refuses_cycles() {
        let display = HeadlessDisplay::new();
        let mut tree = tree();
        let (root, games, _) = cascade(&mut tree, &display);
        open_all(&mut tree, root, games);

        let rect = tree.item_screen_rect(games, 0).unwrap();
        assert_eq!(
            tree.open_child(games, root, rect, 0),
            Err(PopupError::CascadeCycle {
                parent: games,
                child: root
            })
        );
        assert_eq!(
            tree.open_child(root, root, rect, 0),
            Err(PopupError::CascadeCycle {
                parent: root,
                child: root
            })
        );
    }

    #[test]
    fn adding_items_to_visible_popup_relayouts() {
        let display = HeadlessDisplay::new();
        let mut tree = tree();
        let (root, _, _) = cascade(&mut tree, &display);
        tree.show_at(root, Point::new(100, 100)).unwrap();
        let window = tree.get(root).unwrap().window_id();
        let before = display.snapshot(window).unwrap().size.1;

        tree.add_item(root, PopupItem::separator()).unwrap();
        assert!(tree.get(root).unwrap().is_sized());
        assert_eq!(display.snapshot(window).unwrap().size.1, before + 9 + 2);
    }

    #[test]
    fn removing_inviting_folder_closes_child() {
        let display = HeadlessDisplay::new();
        let mut tree = tree();
        let (root, games, _) = cascade(&mut tree, &display);
        open_all(&mut tree, root, games);

        tree.remove_item(root, 0).unwrap();
        assert_eq!(tree.get(root).unwrap().child_item(), Some(0));

        let removed = tree.remove_item(root, 0).unwrap();
        assert_eq!(removed.folder_popup(), Some(games));
        assert_eq!(tree.state(root).unwrap(), CascadeState::Open);
        assert!(!tree.get(games).unwrap().is_visible());
    }

    #[test]
    fn tall_popup_splits_into_columns_on_small_monitor() {
        let display = HeadlessDisplay::new();
        let mut tree = PopupTree::new(
            MonitorLayout::single(Rect::new(0, 0, 1920, 50)),
            DryRunSink::new(),
        );
        let id = popup(&mut tree, &display, "tall");
        for name in ["a", "b", "c"] {
            tree.add_item(id, PopupItem::info(name).with_height(20)).unwrap();
        }
        tree.show_at(id, Point::new(10, 10)).unwrap();

        let p = tree.get(id).unwrap();
        let layout = p.layout().unwrap();
        assert_eq!(layout.columns, 2);
        assert_eq!(layout.cells[2], (1, 0));
        assert_eq!(p.item(2).unwrap().position(), Point::new(5 + 200 + 2, 5));
    }

    #[test]
    fn release_invalidates_handles() {
        let display = HeadlessDisplay::new();
        let mut tree = tree();
        let (root, games, more) = cascade(&mut tree, &display);
        open_all(&mut tree, root, games);

        assert_eq!(tree.release_hierarchy(root).unwrap(), 3);
        assert!(tree.is_empty());
        assert_eq!(display.window_count(), 0);
        assert_eq!(tree.get(more).err(), Some(PopupError::UnknownPopup(more)));

        let fresh = popup(&mut tree, &display, "fresh");
        assert_ne!(fresh, root);
        assert!(!tree.contains(root));
    }

    #[test]
    fn bang_shows_matching_popup() {
        let display = HeadlessDisplay::new();
        let mut tree = tree();
        let window = Box::new(display.create_window("apps"));
        let id = tree.create(
            "Apps",
            Some("!AppsPopup"),
            "apps",
            &PopupSettings::default(),
            window,
        );

        assert_eq!(tree.find_by_bang("!appspopup"), Some(id));
        assert!(tree.run_bang("!AppsPopup", Point::new(300, 300)).unwrap());
        assert!(tree.get(id).unwrap().is_visible());
        assert!(!tree.run_bang("!Missing", Point::new(0, 0)).unwrap());
    }

    #[test]
    fn reload_applies_new_settings() {
        let display = HeadlessDisplay::new();
        let mut tree = tree();
        let (root, _, _) = cascade(&mut tree, &display);
        tree.show_at(root, Point::new(100, 100)).unwrap();

        let settings = PopupSettings {
            padding: Padding::uniform(10),
            width: 260,
            ..PopupSettings::default()
        };
        tree.reload_settings(&settings);
        assert!(!tree.get(root).unwrap().is_sized());

        tree.show_at(root, Point::new(100, 100)).unwrap();
        let window = tree.get(root).unwrap().window_id();
        assert_eq!(
            display.snapshot(window).unwrap().size,
            (260, 10 + 22 * 3 + 2 * 2 + 10)
        );
    }
}
