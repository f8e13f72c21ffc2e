use std::sync::Arc;

/// Read access to the live documents a tracker follows.
pub trait DocumentSource {
    /// Full current text of `file`, if the document is known.
    fn text(&self, file: &str) -> Option<String>;

    /// Number of lines in `file`. A trailing line break does not start a
    /// new line.
    fn line_count(&self, file: &str) -> Option<usize> {
        self.text(file).map(|text| text.lines().count())
    }
}

impl<T: DocumentSource + ?Sized> DocumentSource for Arc<T> {
    fn text(&self, file: &str) -> Option<String> {
        (**self).text(file)
    }

    fn line_count(&self, file: &str) -> Option<usize> {
        (**self).line_count(file)
    }
}

impl<T: DocumentSource + ?Sized> DocumentSource for &T {
    fn text(&self, file: &str) -> Option<String> {
        (**self).text(file)
    }

    fn line_count(&self, file: &str) -> Option<usize> {
        (**self).line_count(file)
    }
}
