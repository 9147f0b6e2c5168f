use axum::Json;

/// Requires a valid session
/// ---
/// parameters:
/// - name: Authorization
///   in: header
///   type: string
///   required: true
/// security:
/// - session: []
/// securityDefinitions:
///   session:
///     type: apiKey
///     name: Authorization
///     in: header
pub fn login_required() {}

/// List users
/// ---
/// tags:
/// - users
/// responses:
///   200:
///     description: Users
///     schema:
///       type: array
///       items:
///         schema:
///           id: User
///           type: object
///           properties:
///             name:
///               type: string
pub async fn list_users() -> Json<Vec<String>> {
    Json(Vec::new())
}

/// Create user
/// ---
/// parameters:
/// - name: data
///   in: body
///   schema:
///     id: User
///     type: object
///     properties:
///       name:
///         type: string
/// responses:
///   201:
///     description: Created
pub async fn create_user() {}
