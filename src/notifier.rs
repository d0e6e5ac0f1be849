// SPDX-License-Identifier: MPL-2.0
//! Transient toast notifications over a shared document tree.
//!
//! A [`Notifier`] owns at most one toast element at a time and drives its
//! whole lifecycle: render on [`show`](Notifier::show), refresh on
//! [`update`](Notifier::update), fade on [`close`](Notifier::close) and
//! removal once the fade grace has passed. Time is modelled as deadline
//! slots instead of live timers; callers poll with a clock of their choice,
//! which keeps the type free of background threads and makes expiry exact
//! under test.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::config::{defaults, Options, OptionsPatch};
use crate::dom::{Document, NodeId, SharedDocument};
use crate::error::{Error, Result};

static NEXT_TOAST_ID: AtomicU64 = AtomicU64::new(1);

/// Identity stamped on the toast element.
///
/// Ids are allocated from a process-wide counter, so elements rendered by
/// different notifiers into one shared document never collide. Each
/// notifier takes its id at construction and keeps it for life; an element
/// recreated after full detach carries the same id as its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToastId(u64);

impl ToastId {
    fn next() -> Self {
        Self(NEXT_TOAST_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Value of the element's `id` attribute, e.g. `toastling-7`.
    pub fn element_id(&self) -> String {
        format!("{}{}", defaults::ID_PREFIX, self.0)
    }
}

/// Lifecycle event reported by [`Notifier::poll`] and the async driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierEvent {
    /// The toast was rendered or revived.
    Shown,
    /// The toast content or presentation was refreshed in place.
    Updated,
    /// The display duration elapsed and the fade started.
    Expired,
    /// The toast was closed on request and the fade started.
    Closed,
    /// The fade grace elapsed and the element left the document.
    Detached,
    /// A command failed; the message carries the underlying error text.
    Error(String),
}

/// A single transient toast bound to a shared document.
#[derive(Debug)]
pub struct Notifier {
    options: Options,
    document: SharedDocument,
    toast_id: ToastId,
    root: Option<NodeId>,
    message_node: Option<NodeId>,
    expire_at: Option<Instant>,
    detach_at: Option<Instant>,
}

impl Notifier {
    /// Creates a notifier with default options.
    pub fn new(document: SharedDocument) -> Self {
        Self::with_options(document, Options::default())
    }

    pub fn with_options(document: SharedDocument, options: Options) -> Self {
        Self {
            options,
            document,
            toast_id: ToastId::next(),
            root: None,
            message_node: None,
            expire_at: None,
            detach_at: None,
        }
    }

    /// Creates a notifier from a partial configuration applied over the
    /// defaults, the usual way to pick up a loaded preset.
    pub fn from_patch(document: SharedDocument, patch: &OptionsPatch) -> Self {
        Self::with_options(document, Options::from_patch(patch))
    }

    /// Shows the toast using the wall clock. See [`show_at`](Self::show_at).
    pub fn show(&mut self) -> Result<&mut Self> {
        self.show_at(Instant::now())
    }

    /// Shows the toast, treating `now` as the current instant.
    ///
    /// Without a live element this renders a fresh one and attaches it to
    /// the document body. A fading toast is revived in place instead: its
    /// pending removal is cancelled and full opacity restored, keeping the
    /// element and its id. Either way the display duration restarts from
    /// `now` unless the options ask for an infinite toast.
    pub fn show_at(&mut self, now: Instant) -> Result<&mut Self> {
        let live = self.root.filter(|&root| self.doc().contains(root));
        match live {
            Some(root) => self.revive(root),
            None => {
                self.root = None;
                self.render()?;
            }
        }
        self.detach_at = None;
        self.expire_at = (!self.options.infinite).then(|| now + self.options.duration);
        Ok(self)
    }

    /// Merges `patch` into the options and refreshes the live element.
    ///
    /// The message content is rewritten first, then the class list is
    /// recomputed from the merged options and the option styles merged into
    /// the element's inline styles. Classes form a set, so repeated error
    /// updates never stack `error` tokens. Timers are left untouched.
    ///
    /// Fails with [`Error::NotShown`] when no element is live and with
    /// [`Error::Markup`] when HTML rendering is on and the new message does
    /// not parse; in the latter case the previous content stays in place.
    pub fn update(&mut self, patch: &OptionsPatch) -> Result<()> {
        let root = self.root.ok_or(Error::NotShown)?;
        let message = self.message_node.ok_or(Error::NotShown)?;
        self.options.apply(patch);
        let mut document = self.doc();
        set_content(&mut document, message, &self.options)?;
        document.set_classes(root, container_classes(&self.options));
        document.merge_styles(root, &self.options.styles);
        Ok(())
    }

    /// Closes the toast using the wall clock. See [`close_at`](Self::close_at).
    pub fn close(&mut self) -> &mut Self {
        self.close_at(Instant::now())
    }

    /// Starts removing the toast, treating `now` as the current instant.
    ///
    /// The element turns transparent immediately but stays in the document
    /// for the fade grace, giving a transition time to play; the pending
    /// expiry is cancelled. Closing a toast that is not visible, including
    /// one already fading, is a no-op.
    pub fn close_at(&mut self, now: Instant) -> &mut Self {
        if let Some(root) = self.root {
            if self.detach_at.is_none() {
                self.begin_removal(root, now);
            }
        }
        self
    }

    /// Removes the element right away, skipping the fade grace.
    pub fn dismiss(&mut self) -> &mut Self {
        self.expire_at = None;
        self.detach();
        self
    }

    /// Polls pending deadlines against the wall clock. See
    /// [`poll_at`](Self::poll_at).
    pub fn poll(&mut self) -> Option<NotifierEvent> {
        self.poll_at(Instant::now())
    }

    /// Fires at most one due deadline, treating `now` as the current
    /// instant, and reports what happened.
    ///
    /// An elapsed display duration starts the fade exactly as a close
    /// would, with the grace measured from the expiry deadline itself, so
    /// late polls do not stretch the schedule. An elapsed fade grace
    /// removes the element from the document. Call again to fire a
    /// follow-up deadline that is already due.
    pub fn poll_at(&mut self, now: Instant) -> Option<NotifierEvent> {
        if let Some(deadline) = self.expire_at {
            if now >= deadline {
                match self.root {
                    Some(root) => {
                        self.begin_removal(root, deadline);
                        return Some(NotifierEvent::Expired);
                    }
                    None => self.expire_at = None,
                }
            }
        }
        if let Some(deadline) = self.detach_at {
            if now >= deadline {
                self.detach();
                return Some(NotifierEvent::Detached);
            }
        }
        None
    }

    /// The next instant at which [`poll_at`](Self::poll_at) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.expire_at, self.detach_at) {
            (Some(expire), Some(detach)) => Some(expire.min(detach)),
            (expire, detach) => expire.or(detach),
        }
    }

    /// Whether a toast element is attached at full opacity.
    pub fn is_visible(&self) -> bool {
        self.root.is_some() && self.detach_at.is_none()
    }

    /// Whether the toast is in its fade grace, transparent but attached.
    pub fn is_fading(&self) -> bool {
        self.root.is_some() && self.detach_at.is_some()
    }

    /// Node id of the live toast element.
    pub fn element(&self) -> Option<NodeId> {
        self.root
    }

    /// Identity of this notifier's element, fixed at construction.
    pub fn toast_id(&self) -> ToastId {
        self.toast_id
    }

    /// The `id` attribute the toast element carries when rendered.
    pub fn element_id(&self) -> String {
        self.toast_id.element_id()
    }

    /// Currently effective options, including every applied patch.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Builds the container and message elements and attaches them.
    fn render(&mut self) -> Result<()> {
        let mut document = self.doc();
        let root = document.create_element(defaults::ELEMENT_TAG);
        document.set_element_id(root, &self.toast_id.element_id());
        document.set_classes(root, container_classes(&self.options));
        document.merge_styles(root, &self.options.styles);
        let message = document.create_element(defaults::ELEMENT_TAG);
        document.add_class(message, defaults::MESSAGE_CLASS);
        document.append_child(root, message);
        if let Err(err) = set_content(&mut document, message, &self.options) {
            document.remove(root);
            return Err(err);
        }
        let body = document.body();
        document.append_child(body, root);
        drop(document);
        self.root = Some(root);
        self.message_node = Some(message);
        Ok(())
    }

    fn revive(&mut self, root: NodeId) {
        self.doc().set_style(root, "opacity", "1");
    }

    fn begin_removal(&mut self, root: NodeId, at: Instant) {
        self.doc().set_style(root, "opacity", "0");
        self.expire_at = None;
        self.detach_at = Some(at + Duration::from_millis(defaults::FADE_GRACE_MS));
    }

    fn detach(&mut self) {
        if let Some(root) = self.root.take() {
            self.doc().remove(root);
        }
        self.message_node = None;
        self.detach_at = None;
    }

    // All writes through this guard overwrite state rather than read it
    // back, so a poisoned lock is safe to keep using.
    fn doc(&self) -> MutexGuard<'_, Document> {
        self.document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Class list for the container: the base class, the position tokens and
/// the error marker when set. Produces a set, so recomputing is idempotent.
fn container_classes(options: &Options) -> Vec<String> {
    let mut classes = vec![defaults::CONTAINER_CLASS.to_string()];
    classes.extend(options.position.split_whitespace().map(str::to_string));
    if options.is_error {
        classes.push(defaults::ERROR_CLASS.to_string());
    }
    classes
}

/// Replaces the message node's children with the configured content,
/// either a single text node or the parsed markup fragment. The fragment
/// is parsed before anything is cleared, so a parse failure leaves the
/// previous content in place.
fn set_content(document: &mut Document, message: NodeId, options: &Options) -> Result<()> {
    if options.render_html {
        let nodes = document.parse_fragment(&options.message)?;
        document.clear_children(message);
        for node in nodes {
            document.append_child(message, node);
        }
    } else {
        document.clear_children(message);
        let text = document.create_text(&options.message);
        document.append_child(message, text);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn notifier(patch: OptionsPatch) -> Notifier {
        Notifier::from_patch(Document::shared(), &patch)
    }

    #[test]
    fn show_renders_container_and_message() {
        let document = Document::shared();
        let mut n = Notifier::from_patch(
            document.clone(),
            &OptionsPatch::new().with_message("hello"),
        );
        let t0 = Instant::now();

        n.show_at(t0).unwrap();

        let doc = document.lock().unwrap();
        let root = n.element().unwrap();
        assert!(doc.is_attached(root));
        assert_eq!(doc.tag(root), Some("div"));
        assert_eq!(
            doc.classes(root),
            ["toastling-container", "bottom", "right"]
        );
        let message = doc.children(root)[0];
        assert_eq!(doc.classes(message), ["toastling-message"]);
        assert_eq!(doc.text(doc.children(message)[0]), Some("hello"));
    }

    #[test]
    fn show_renders_error_class_from_options() {
        let document = Document::shared();
        let mut n = Notifier::from_patch(
            document.clone(),
            &OptionsPatch::new().with_is_error(true),
        );
        n.show_at(Instant::now()).unwrap();

        let doc = document.lock().unwrap();
        assert_eq!(
            doc.classes(n.element().unwrap()),
            ["toastling-container", "bottom", "right", "error"]
        );
    }

    #[test]
    fn rendered_element_is_reachable_by_id() {
        let document = Document::shared();
        let mut n = Notifier::new(document.clone());
        n.show_at(Instant::now()).unwrap();

        let id = n.element_id();
        assert!(id.starts_with("toastling-"));
        assert_eq!(
            document.lock().unwrap().element_by_id(&id),
            n.element()
        );
    }

    #[test]
    fn show_arms_expiry_from_now() {
        let mut n = notifier(OptionsPatch::new().with_duration_ms(2_000));
        let t0 = Instant::now();

        n.show_at(t0).unwrap();

        assert_eq!(n.next_deadline(), Some(t0 + Duration::from_millis(2_000)));
        assert!(n.is_visible());
    }

    #[test]
    fn infinite_toast_has_no_deadline() {
        let mut n = notifier(OptionsPatch::new().with_infinite(true));
        n.show_at(Instant::now()).unwrap();

        assert!(n.next_deadline().is_none());
        assert!(n.is_visible());
    }

    #[test]
    fn update_before_show_is_rejected() {
        let mut n = notifier(OptionsPatch::new());
        let err = n.update(&OptionsPatch::default()).unwrap_err();
        assert!(matches!(err, Error::NotShown));
    }

    #[test]
    fn update_refreshes_content_and_classes() {
        let document = Document::shared();
        let mut n = Notifier::from_patch(
            document.clone(),
            &OptionsPatch::new().with_message("first"),
        );
        n.show_at(Instant::now()).unwrap();

        let patch = OptionsPatch {
            message: Some("second".to_string()),
            is_error: Some(true),
            ..OptionsPatch::default()
        };
        n.update(&patch).unwrap();

        let doc = document.lock().unwrap();
        let root = n.element().unwrap();
        assert_eq!(
            doc.classes(root),
            ["toastling-container", "bottom", "right", "error"]
        );
        let message = doc.children(root)[0];
        assert_eq!(doc.text(doc.children(message)[0]), Some("second"));
    }

    #[test]
    fn repeated_error_updates_do_not_stack_classes() {
        let document = Document::shared();
        let mut n = Notifier::new(document.clone());
        n.show_at(Instant::now()).unwrap();

        let patch = OptionsPatch {
            is_error: Some(true),
            ..OptionsPatch::default()
        };
        n.update(&patch).unwrap();
        n.update(&patch).unwrap();
        n.update(&patch).unwrap();

        let doc = document.lock().unwrap();
        let classes = doc.classes(n.element().unwrap());
        assert_eq!(
            classes.iter().filter(|class| *class == "error").count(),
            1
        );
    }

    #[test]
    fn element_styles_accumulate_while_options_styles_replace() {
        let document = Document::shared();
        let mut n = Notifier::from_patch(
            document.clone(),
            &OptionsPatch::new().with_style("color", "red"),
        );
        n.show_at(Instant::now()).unwrap();

        let patch = OptionsPatch {
            styles: Some(
                [("margin".to_string(), "8px".to_string())]
                    .into_iter()
                    .collect(),
            ),
            ..OptionsPatch::default()
        };
        n.update(&patch).unwrap();

        let doc = document.lock().unwrap();
        let root = n.element().unwrap();
        assert_eq!(doc.style(root, "color"), Some("red"));
        assert_eq!(doc.style(root, "margin"), Some("8px"));
        assert!(!n.options().styles.contains_key("color"));
        assert!(n.options().styles.contains_key("margin"));
    }

    #[test]
    fn close_starts_fade_and_cancels_expiry() {
        let document = Document::shared();
        let mut n = Notifier::new(document.clone());
        let t0 = Instant::now();
        n.show_at(t0).unwrap();

        let t1 = t0 + Duration::from_millis(500);
        n.close_at(t1);

        assert!(n.is_fading());
        assert!(!n.is_visible());
        assert_eq!(n.next_deadline(), Some(t1 + Duration::from_millis(1_000)));
        let doc = document.lock().unwrap();
        assert_eq!(doc.style(n.element().unwrap(), "opacity"), Some("0"));
    }

    #[test]
    fn close_before_show_is_a_noop() {
        let mut n = notifier(OptionsPatch::new());
        n.close_at(Instant::now());
        assert!(!n.is_visible());
        assert!(!n.is_fading());
        assert!(n.next_deadline().is_none());
    }

    #[test]
    fn second_close_keeps_the_first_detach_deadline() {
        let mut n = notifier(OptionsPatch::new());
        let t0 = Instant::now();
        n.show_at(t0).unwrap();

        n.close_at(t0 + Duration::from_millis(100));
        n.close_at(t0 + Duration::from_millis(700));

        assert_eq!(n.next_deadline(), Some(t0 + Duration::from_millis(1_100)));
    }

    #[test]
    fn expiry_fades_then_detaches() {
        let document = Document::shared();
        let mut n = Notifier::from_patch(
            document.clone(),
            &OptionsPatch::new().with_duration_ms(3_000),
        );
        let t0 = Instant::now();
        n.show_at(t0).unwrap();

        assert_eq!(n.poll_at(t0 + Duration::from_millis(2_999)), None);
        assert_eq!(
            n.poll_at(t0 + Duration::from_millis(3_000)),
            Some(NotifierEvent::Expired)
        );
        assert!(n.is_fading());

        // Grace runs from the expiry deadline, not the poll instant.
        assert_eq!(n.next_deadline(), Some(t0 + Duration::from_millis(4_000)));
        assert_eq!(
            n.poll_at(t0 + Duration::from_millis(4_000)),
            Some(NotifierEvent::Detached)
        );
        assert!(!n.is_fading());
        assert_eq!(n.element(), None);
        assert_eq!(document.lock().unwrap().node_count(), 1);
    }

    #[test]
    fn show_during_fade_revives_the_same_element() {
        let document = Document::shared();
        let mut n = Notifier::new(document.clone());
        let t0 = Instant::now();
        n.show_at(t0).unwrap();
        let first_element = n.element().unwrap();

        n.close_at(t0 + Duration::from_millis(1_000));
        let t2 = t0 + Duration::from_millis(1_500);
        n.show_at(t2).unwrap();

        assert_eq!(n.element(), Some(first_element));
        assert!(n.is_visible());
        assert_eq!(n.next_deadline(), Some(t2 + Duration::from_millis(3_000)));
        let doc = document.lock().unwrap();
        assert_eq!(doc.style(first_element, "opacity"), Some("1"));
    }

    #[test]
    fn rerender_after_detach_keeps_the_instance_id() {
        let document = Document::shared();
        let mut n = Notifier::new(document.clone());
        let t0 = Instant::now();
        n.show_at(t0).unwrap();
        let first_element = n.element().unwrap();
        let id = n.element_id();

        n.close_at(t0);
        n.poll_at(t0 + Duration::from_millis(1_000)).unwrap();
        n.show_at(t0 + Duration::from_millis(2_000)).unwrap();

        // A fresh element, still reachable under the construction-time id
        let second_element = n.element().unwrap();
        assert_ne!(second_element, first_element);
        assert_eq!(n.element_id(), id);
        assert_eq!(
            document.lock().unwrap().element_by_id(&id),
            Some(second_element)
        );
    }

    #[test]
    fn html_message_renders_child_elements() {
        let document = Document::shared();
        let mut n = Notifier::from_patch(
            document.clone(),
            &OptionsPatch::new()
                .with_message("<b>bold</b> move")
                .with_render_html(true),
        );
        n.show_at(Instant::now()).unwrap();

        let doc = document.lock().unwrap();
        let message = doc.children(n.element().unwrap())[0];
        let children = doc.children(message);
        assert_eq!(children.len(), 2);
        assert_eq!(doc.tag(children[0]), Some("b"));
        assert_eq!(doc.text(children[1]), Some(" move"));
    }

    #[test]
    fn malformed_html_fails_show_without_leaking_nodes() {
        let document = Document::shared();
        let mut n = Notifier::from_patch(
            document.clone(),
            &OptionsPatch::new().with_message("<b>oops").with_render_html(true),
        );

        let err = n.show_at(Instant::now()).unwrap_err();

        assert!(matches!(err, Error::Markup(_)));
        assert_eq!(n.element(), None);
        assert_eq!(document.lock().unwrap().node_count(), 1);
    }

    #[test]
    fn malformed_html_update_keeps_previous_content() {
        let document = Document::shared();
        let mut n = Notifier::from_patch(
            document.clone(),
            &OptionsPatch::new().with_message("fine").with_render_html(true),
        );
        n.show_at(Instant::now()).unwrap();

        let patch = OptionsPatch {
            message: Some("<i>broken".to_string()),
            ..OptionsPatch::default()
        };
        assert!(n.update(&patch).is_err());

        let doc = document.lock().unwrap();
        let message = doc.children(n.element().unwrap())[0];
        assert_eq!(doc.text(doc.children(message)[0]), Some("fine"));
    }

    #[test]
    fn dismiss_removes_without_grace() {
        let document = Document::shared();
        let mut n = Notifier::new(document.clone());
        n.show_at(Instant::now()).unwrap();

        n.dismiss();

        assert_eq!(n.element(), None);
        assert!(n.next_deadline().is_none());
        assert_eq!(document.lock().unwrap().node_count(), 1);
    }

    #[test]
    fn two_notifiers_share_one_document() {
        let document = Document::shared();
        let mut a = Notifier::new(document.clone());
        let mut b = Notifier::new(document.clone());
        a.show_at(Instant::now()).unwrap();
        b.show_at(Instant::now()).unwrap();

        let doc = document.lock().unwrap();
        assert_eq!(doc.children(doc.body()).len(), 2);
        assert_ne!(a.element(), b.element());
        assert_ne!(a.toast_id(), b.toast_id());
        assert_ne!(a.element_id(), b.element_id());
    }
}
