/// Shared responder documentation
pub trait Responder {
    /// ---
    /// responses:
    ///   500:
    ///     description: Server error
    fn on_get(&self) {}
}

pub struct HealthResource;

impl Responder for HealthResource {
    /// Health status
    /// Reports whether the service is up
    /// ---
    /// tags:
    /// - ops
    /// responses:
    ///   200:
    ///     description: Healthy
    fn on_get(&self) {}
}

impl HealthResource {
    pub fn on_options(&self) {}
}

pub struct ItemResource;

impl ItemResource {
    /// Update an item
    /// ---
    /// parameters:
    /// - name: id
    ///   in: path
    ///   type: integer
    ///   required: true
    pub fn on_put(&self) {}

    /// Delete an item
    pub fn on_delete(&self) {}

    fn load(&self) {}
}
