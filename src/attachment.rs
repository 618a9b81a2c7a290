use crate::header::Parameters;
use crate::resource::Resource;
use std::slice::{Iter, IterMut};

/// File carried by a message
///
/// Linked (inline) attachments are referenced from the body through their
/// `Content-ID` and end up in a `multipart/related` container. Unlinked ones
/// are regular attachments placed in `multipart/mixed`.
#[derive(Debug)]
pub struct Attachment {
    file_name: String,
    content_type: String,
    cid: String,
    content_location: String,
    is_inline: bool,
    resource: Resource,
    custom_content_type_params: Parameters,
}

impl Attachment {
    /// Create a regular attachment
    pub fn new<N, T, R>(file_name: N, content_type: T, resource: R) -> Self
    where
        N: Into<String>,
        T: Into<String>,
        R: Into<Resource>,
    {
        let content_type = content_type.into();
        Attachment {
            file_name: file_name.into(),
            content_type: if content_type.trim().is_empty() {
                mime::APPLICATION_OCTET_STREAM.essence_str().into()
            } else {
                content_type
            },
            cid: String::new(),
            content_location: String::new(),
            is_inline: false,
            resource: resource.into(),
            custom_content_type_params: Parameters::new(),
        }
    }

    /// Set the Content-ID and move the attachment
    ///
    /// Angle brackets are added when missing.
    pub fn with_cid<S: AsRef<str>>(mut self, cid: S) -> Self {
        let cid = cid.as_ref().trim();
        self.cid = if cid.is_empty() || cid.starts_with('<') {
            cid.into()
        } else {
            format!("<{}>", cid)
        };
        self
    }

    /// Set the Content-Location and move the attachment
    #[inline]
    pub fn with_content_location<S: Into<String>>(mut self, location: S) -> Self {
        self.content_location = location.into();
        self
    }

    /// Mark the attachment as linked from the body
    #[inline]
    pub fn inline(mut self) -> Self {
        self.is_inline = true;
        self
    }

    /// Add a custom `Content-Type` parameter and move the attachment
    #[inline]
    pub fn with_param<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.custom_content_type_params = self.custom_content_type_params.with(name, value);
        self
    }

    #[inline]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[inline]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[inline]
    pub fn cid(&self) -> &str {
        &self.cid
    }

    #[inline]
    pub fn content_location(&self) -> &str {
        &self.content_location
    }

    #[inline]
    pub fn is_inline(&self) -> bool {
        self.is_inline
    }

    #[inline]
    pub fn custom_content_type_params(&self) -> &Parameters {
        &self.custom_content_type_params
    }

    #[inline]
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Hand the payload over to a serialization pass
    #[inline]
    pub(crate) fn take_resource(&mut self) -> Resource {
        self.resource.share_or_take()
    }

    /// Split into its payload, content type and custom parameters
    pub(crate) fn into_body(self) -> (String, Resource, Parameters) {
        (self.content_type, self.resource, self.custom_content_type_params)
    }
}

/// Ordered attachments of a message
#[derive(Debug, Default)]
pub struct Attachments(Vec<Attachment>);

impl Attachments {
    #[inline]
    pub fn new() -> Self {
        Attachments(Vec::new())
    }

    #[inline]
    pub fn push(&mut self, attachment: Attachment) -> &mut Self {
        self.0.push(attachment);
        self
    }

    /// Attachments referenced from the body
    pub fn linked(&self) -> impl Iterator<Item = &Attachment> {
        self.0.iter().filter(|attachment| attachment.is_inline)
    }

    /// Standalone attachments
    pub fn unlinked(&self) -> impl Iterator<Item = &Attachment> {
        self.0.iter().filter(|attachment| !attachment.is_inline)
    }

    #[inline]
    pub fn has_linked(&self) -> bool {
        self.linked().next().is_some()
    }

    #[inline]
    pub fn has_unlinked(&self) -> bool {
        self.unlinked().next().is_some()
    }

    #[inline]
    pub fn iter(&self) -> Iter<Attachment> {
        self.0.iter()
    }

    #[inline]
    pub(crate) fn iter_mut(&mut self) -> IterMut<Attachment> {
        self.0.iter_mut()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Take the only attachment out of the collection
    ///
    /// Gives `None` and leaves the collection untouched unless it holds
    /// exactly one attachment.
    pub(crate) fn take_single(&mut self) -> Option<Attachment> {
        if self.0.len() == 1 {
            self.0.pop()
        } else {
            None
        }
    }
}

impl Extend<Attachment> for Attachments {
    fn extend<T: IntoIterator<Item = Attachment>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Attachments {
    type Item = &'a Attachment;
    type IntoIter = Iter<'a, Attachment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod test {
    use super::{Attachment, Attachments};

    #[test]
    fn partition_linked_unlinked() {
        let mut attachments = Attachments::new();
        attachments
            .push(Attachment::new("a.png", "image/png", "a").with_cid("a").inline())
            .push(Attachment::new("b.pdf", "application/pdf", "b"))
            .push(Attachment::new("c.png", "image/png", "c").inline());

        let linked: Vec<_> = attachments.linked().map(Attachment::file_name).collect();
        let unlinked: Vec<_> = attachments.unlinked().map(Attachment::file_name).collect();

        assert_eq!(linked, vec!["a.png", "c.png"]);
        assert_eq!(unlinked, vec!["b.pdf"]);
        assert!(attachments.has_linked() && attachments.has_unlinked());
    }

    #[test]
    fn cid_gets_brackets() {
        assert_eq!(Attachment::new("", "image/png", "").with_cid("img1").cid(), "<img1>");
        assert_eq!(Attachment::new("", "image/png", "").with_cid("<img1>").cid(), "<img1>");
    }

    #[test]
    fn default_content_type() {
        assert_eq!(
            Attachment::new("blob", " ", "").content_type(),
            "application/octet-stream"
        );
    }

    #[test]
    fn take_single_only_when_alone() {
        let mut attachments = Attachments::new();
        attachments
            .push(Attachment::new("a", "text/plain", "a"))
            .push(Attachment::new("b", "text/plain", "b"));
        assert!(attachments.take_single().is_none());
        assert_eq!(attachments.len(), 2);

        attachments.clear();
        attachments.push(Attachment::new("a", "text/plain", "a"));
        assert_eq!(attachments.take_single().map(|a| a.file_name().to_string()), Some("a".into()));
        assert!(attachments.is_empty());
    }
}
