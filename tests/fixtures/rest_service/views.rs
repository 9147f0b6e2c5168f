/// Standard model actions
pub trait ModelViewSet {
    /// Retrieve one object
    /// ---
    /// responses:
    ///   404:
    ///     description: Not found
    fn retrieve(&self) {}

    fn list(&self) {}

    fn create(&self) {}

    fn update(&self) {}

    fn destroy(&self) {}
}

/// Books of the library
/// ---
/// tags:
/// - books
pub struct BookViewSet;

impl ModelViewSet for BookViewSet {
    /// Create a book
    /// Stores a new book on the shelf
    /// ---
    /// parameters:
    /// - name: X-Request-Id
    ///   in: header
    ///   type: string
    fn create(&self) {}
}
