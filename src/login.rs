//! Entry screen: name collection and the registration handshake.
//!
//! The screen mounts two panels, a name-entry box and a static instructions
//! box, claims the key-press slot, and waits for Enter. A non-empty name
//! registers the client as a player; an empty one registers it as a watcher.
//! Either way the view sends exactly one handshake command, tears itself
//! down, and hands the outcome back to the caller as a [`Handshake`] value.
//!
//! The lifecycle is a two-state machine, `Active` or `Terminated`, carried
//! as a tagged enum so a half-constructed or half-destroyed view cannot be
//! represented. All collaborators (page, channel, key slot) are passed in by
//! the caller; the view owns nothing global.

use anyhow::{bail, Result};
use crossterm::event::{KeyCode, KeyEvent};

use crate::keys::{KeyRouter, KeySubscription};
use crate::net::{Channel, ClientCommand};
use crate::page::{self, Element, ElementId, FieldId, Page, StyleClass};

/// Outcome of the handshake transition, returned to the component that owns
/// client identity. Carries the chosen display name instead of writing it
/// into shared state.
#[derive(Debug, Clone, PartialEq)]
pub enum Handshake {
    /// Registered as a passive watcher; no name was given.
    Watcher,
    /// Registered as an active player under `name` (taken verbatim from the
    /// field: no trimming, no length cap).
    Player { name: String },
}

enum LoginState {
    Active {
        name_field: FieldId,
        entry_box: ElementId,
        instructions_box: ElementId,
        /// The game viewport, hidden while the entry screen is up. Owned by
        /// the caller; we only restore its visibility on teardown.
        container: ElementId,
        subscription: KeySubscription,
    },
    Terminated,
}

/// The entry screen's view state.
pub struct LoginView {
    state: LoginState,
}

impl LoginView {
    /// Mount the entry screen over `container` and claim the key-press slot.
    ///
    /// Fails if the slot is already claimed, which means another view is
    /// still live; the caller must destroy it first rather than silently
    /// leaking its mounted elements.
    pub fn create(
        page: &mut impl Page,
        router: &mut KeyRouter,
        container: ElementId,
    ) -> Result<Self> {
        let subscription = router.claim()?;

        let name_field = page.create_field(StyleClass::FormInput, "Name");
        let entry_box = page.mount(Element::panel(
            StyleClass::LoginBox,
            vec![
                page::text("Enter your name"),
                page::br(),
                page::span(
                    StyleClass::Subtext,
                    "or leave blank and press Enter to watch!",
                ),
                page::br(),
                page::Node::Field(name_field),
            ],
        ));
        let instructions_box = page.mount(Element::panel(
            StyleClass::InstructionsBox,
            vec![
                page::span(StyleClass::GameTitle, "Lasso"),
                page::br(),
                page::br(),
                page::text("Make loops around objects and other players, but don't touch them!"),
                page::br(),
                page::text("Your tail will break if you move too fast."),
            ],
        ));
        page.hide(container);
        page.focus(name_field);

        Ok(Self {
            state: LoginState::Active {
                name_field,
                entry_box,
                instructions_box,
                container,
                subscription,
            },
        })
    }

    /// The handshake transition.
    ///
    /// On Enter, reads the name field, sends the matching registration
    /// command, tears the view down, and returns the outcome. Every other
    /// key is ignored: no message, no state change. Calling this on a
    /// terminated view is a caller bug and fails instead of faulting on
    /// absent state.
    pub fn on_key(
        &mut self,
        key: KeyEvent,
        page: &mut impl Page,
        channel: &mut impl Channel,
        router: &mut KeyRouter,
    ) -> Result<Option<Handshake>> {
        let name_field = match &self.state {
            LoginState::Active { name_field, .. } => *name_field,
            LoginState::Terminated => {
                bail!("key event delivered to a terminated login view")
            }
        };
        if key.code != KeyCode::Enter {
            return Ok(None);
        }

        // Emptiness is the only branch condition; a watcher needs no name
        // and any non-empty input is accepted as a display name.
        let name = page.field_value(name_field);
        let handshake = if name.is_empty() {
            channel.send(ClientCommand::RegisterWatcher)?;
            Handshake::Watcher
        } else {
            channel.send(ClientCommand::RegisterPlayer { name: name.clone() })?;
            Handshake::Player { name }
        };

        self.destroy(page, router);
        Ok(Some(handshake))
    }

    /// Tear the view down: unmount both panels, restore the container, and
    /// release the key subscription.
    ///
    /// Idempotent; destroying a terminated view is a no-op.
    pub fn destroy(&mut self, page: &mut impl Page, router: &mut KeyRouter) {
        match std::mem::replace(&mut self.state, LoginState::Terminated) {
            LoginState::Active {
                entry_box,
                instructions_box,
                container,
                subscription,
                ..
            } => {
                page.unmount(entry_box);
                page.unmount(instructions_box);
                page.show(container);
                router.release(subscription);
            }
            LoginState::Terminated => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    // ── Recording collaborators ──────────────────────────────────────────

    /// Page double that tracks mounts, visibility, and field contents.
    #[derive(Default)]
    struct RecordingPage {
        fields: Vec<String>,
        mounted: Vec<(ElementId, Element, bool)>,
        focused: Option<FieldId>,
        next_id: u64,
    }

    impl RecordingPage {
        fn new_with_container() -> (Self, ElementId) {
            let mut page = Self::default();
            let container = page.mount(Element::panel(StyleClass::InstructionsBox, vec![]));
            (page, container)
        }

        fn set_field(&mut self, id: FieldId, value: &str) {
            self.fields[id.0] = value.to_string();
        }

        fn mounted_count(&self) -> usize {
            self.mounted.len()
        }
    }

    impl Page for RecordingPage {
        fn create_field(&mut self, _class: StyleClass, _placeholder: &str) -> FieldId {
            self.fields.push(String::new());
            FieldId(self.fields.len() - 1)
        }

        fn mount(&mut self, element: Element) -> ElementId {
            let id = ElementId(self.next_id);
            self.next_id += 1;
            self.mounted.push((id, element, true));
            id
        }

        fn unmount(&mut self, id: ElementId) {
            self.mounted.retain(|(mid, _, _)| *mid != id);
        }

        fn show(&mut self, id: ElementId) {
            if let Some(m) = self.mounted.iter_mut().find(|(mid, _, _)| *mid == id) {
                m.2 = true;
            }
        }

        fn hide(&mut self, id: ElementId) {
            if let Some(m) = self.mounted.iter_mut().find(|(mid, _, _)| *mid == id) {
                m.2 = false;
            }
        }

        fn is_visible(&self, id: ElementId) -> bool {
            self.mounted
                .iter()
                .find(|(mid, _, _)| *mid == id)
                .is_some_and(|(_, _, visible)| *visible)
        }

        fn focus(&mut self, id: FieldId) {
            self.focused = Some(id);
        }

        fn field_value(&self, id: FieldId) -> String {
            self.fields[id.0].clone()
        }
    }

    /// Channel double that records every command sent.
    #[derive(Default)]
    struct RecordingChannel {
        sent: Vec<ClientCommand>,
    }

    impl Channel for RecordingChannel {
        fn send(&mut self, command: ClientCommand) -> Result<()> {
            self.sent.push(command);
            Ok(())
        }
    }

    fn is_active(view: &LoginView) -> bool {
        matches!(view.state, LoginState::Active { .. })
    }

    fn setup() -> (RecordingPage, ElementId, KeyRouter, RecordingChannel) {
        let (page, container) = RecordingPage::new_with_container();
        (page, container, KeyRouter::new(), RecordingChannel::default())
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    #[test]
    fn create_mounts_both_boxes_and_claims_the_slot() {
        let (mut page, container, mut router, _) = setup();
        let view = LoginView::create(&mut page, &mut router, container).unwrap();
        assert!(is_active(&view));
        // Container plus entry box plus instructions box.
        assert_eq!(page.mounted_count(), 3);
        assert!(!page.is_visible(container));
        assert!(page.focused.is_some());
        assert!(router.is_claimed());
    }

    #[test]
    fn create_while_slot_claimed_is_rejected() {
        let (mut page, container, mut router, _) = setup();
        let _first = LoginView::create(&mut page, &mut router, container).unwrap();
        let before = page.mounted_count();
        assert!(LoginView::create(&mut page, &mut router, container).is_err());
        // The rejected create must not leak half-mounted elements.
        assert_eq!(page.mounted_count(), before);
    }

    #[test]
    fn destroy_unmounts_restores_and_releases() {
        let (mut page, container, mut router, _) = setup();
        let mut view = LoginView::create(&mut page, &mut router, container).unwrap();
        view.destroy(&mut page, &mut router);
        assert!(!is_active(&view));
        assert_eq!(page.mounted_count(), 1); // only the container remains
        assert!(page.is_visible(container));
        assert!(!router.is_claimed());
    }

    #[test]
    fn destroy_is_idempotent() {
        let (mut page, container, mut router, _) = setup();
        let mut view = LoginView::create(&mut page, &mut router, container).unwrap();
        view.destroy(&mut page, &mut router);
        view.destroy(&mut page, &mut router);
        assert!(!is_active(&view));
        assert_eq!(page.mounted_count(), 1);
        assert!(!router.is_claimed());
    }

    #[test]
    fn slot_can_be_reclaimed_after_destroy() {
        let (mut page, container, mut router, _) = setup();
        let mut view = LoginView::create(&mut page, &mut router, container).unwrap();
        view.destroy(&mut page, &mut router);
        assert!(LoginView::create(&mut page, &mut router, container).is_ok());
    }

    // ── Handshake transition ─────────────────────────────────────────────

    #[test]
    fn enter_with_name_registers_player_and_tears_down() {
        let (mut page, container, mut router, mut channel) = setup();
        let mut view = LoginView::create(&mut page, &mut router, container).unwrap();
        let field = view_name_field(&view);
        page.set_field(field, "Alice");

        let outcome = view
            .on_key(key(KeyCode::Enter), &mut page, &mut channel, &mut router)
            .unwrap();

        assert_eq!(outcome, Some(Handshake::Player { name: "Alice".into() }));
        assert_eq!(
            channel.sent,
            vec![ClientCommand::RegisterPlayer { name: "Alice".into() }]
        );
        assert!(!is_active(&view));
        assert_eq!(page.mounted_count(), 1);
        assert!(page.is_visible(container));
        assert!(!router.is_claimed());
    }

    #[test]
    fn enter_with_empty_field_registers_watcher() {
        let (mut page, container, mut router, mut channel) = setup();
        let mut view = LoginView::create(&mut page, &mut router, container).unwrap();

        let outcome = view
            .on_key(key(KeyCode::Enter), &mut page, &mut channel, &mut router)
            .unwrap();

        assert_eq!(outcome, Some(Handshake::Watcher));
        assert_eq!(channel.sent, vec![ClientCommand::RegisterWatcher]);
        assert!(!is_active(&view));
        assert!(page.is_visible(container));
    }

    #[test]
    fn name_is_passed_through_unvalidated() {
        // No trimming and no length cap: whitespace-padded input registers
        // as a player under the padded name.
        let (mut page, container, mut router, mut channel) = setup();
        let mut view = LoginView::create(&mut page, &mut router, container).unwrap();
        let field = view_name_field(&view);
        page.set_field(field, "  spaced out  ");

        let outcome = view
            .on_key(key(KeyCode::Enter), &mut page, &mut channel, &mut router)
            .unwrap();

        assert_eq!(
            outcome,
            Some(Handshake::Player {
                name: "  spaced out  ".into()
            })
        );
    }

    #[test]
    fn other_keys_are_ignored() {
        let (mut page, container, mut router, mut channel) = setup();
        let mut view = LoginView::create(&mut page, &mut router, container).unwrap();

        for code in [
            KeyCode::Char('a'),
            KeyCode::Tab,
            KeyCode::Backspace,
            KeyCode::Esc,
        ] {
            let outcome = view
                .on_key(key(code), &mut page, &mut channel, &mut router)
                .unwrap();
            assert_eq!(outcome, None);
        }
        assert!(channel.sent.is_empty());
        assert!(is_active(&view));
        assert_eq!(page.mounted_count(), 3);
        assert!(router.is_claimed());
    }

    #[test]
    fn at_most_one_handshake_per_activation() {
        let (mut page, container, mut router, mut channel) = setup();
        let mut view = LoginView::create(&mut page, &mut router, container).unwrap();
        view.on_key(key(KeyCode::Enter), &mut page, &mut channel, &mut router)
            .unwrap();
        // The view is now terminated; a second Enter is a caller bug, not a
        // second message.
        assert!(view
            .on_key(key(KeyCode::Enter), &mut page, &mut channel, &mut router)
            .is_err());
        assert_eq!(channel.sent.len(), 1);
    }

    fn view_name_field(view: &LoginView) -> FieldId {
        match view.state {
            LoginState::Active { name_field, .. } => name_field,
            LoginState::Terminated => panic!("view is terminated"),
        }
    }
}
