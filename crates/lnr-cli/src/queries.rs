//! GraphQL documents. Paged documents take `$first`/`$after` and expose a
//! `{ nodes pageInfo { hasNextPage endCursor } }` connection.

pub const VIEWER: &str = "query Viewer { viewer { id name email organization { name urlKey } } }";

pub const TEAMS: &str = "query Teams($first: Int, $after: String) { \
    teams(first: $first, after: $after) { \
    nodes { id key name } pageInfo { hasNextPage endCursor } } }";

pub const USERS: &str = "query Users($first: Int, $after: String) { \
    users(first: $first, after: $after) { \
    nodes { id name displayName email active } pageInfo { hasNextPage endCursor } } }";

pub const LABELS: &str = "query Labels($first: Int, $after: String) { \
    issueLabels(first: $first, after: $after) { \
    nodes { id name color team { key } } pageInfo { hasNextPage endCursor } } }";

pub const PROJECTS: &str = "query Projects($first: Int, $after: String) { \
    projects(first: $first, after: $after) { \
    nodes { id name state progress targetDate } pageInfo { hasNextPage endCursor } } }";

const ISSUE_FIELDS: &str = "id identifier title description priority url \
    state { name } assignee { name } team { key } updatedAt";

pub fn issues() -> String {
    format!(
        "query Issues($first: Int, $after: String, $filter: IssueFilter) {{ \
         issues(first: $first, after: $after, filter: $filter) {{ \
         nodes {{ {ISSUE_FIELDS} }} pageInfo {{ hasNextPage endCursor }} }} }}"
    )
}

pub fn issue() -> String {
    format!("query Issue($id: String!) {{ issue(id: $id) {{ {ISSUE_FIELDS} }} }}")
}

pub fn issue_create() -> String {
    format!(
        "mutation IssueCreate($input: IssueCreateInput!) {{ \
         issueCreate(input: $input) {{ success issue {{ {ISSUE_FIELDS} }} }} }}"
    )
}

pub fn issue_update() -> String {
    format!(
        "mutation IssueUpdate($id: String!, $input: IssueUpdateInput!) {{ \
         issueUpdate(id: $id, input: $input) {{ success issue {{ {ISSUE_FIELDS} }} }} }}"
    )
}

pub const ISSUE_DELETE: &str =
    "mutation IssueDelete($id: String!) { issueDelete(id: $id) { success } }";

pub const COMMENTS: &str = "query Comments($id: String!, $first: Int, $after: String) { \
    issue(id: $id) { comments(first: $first, after: $after) { \
    nodes { id body createdAt user { name } } pageInfo { hasNextPage endCursor } } } }";

pub const COMMENT_CREATE: &str = "mutation CommentCreate($input: CommentCreateInput!) { \
    commentCreate(input: $input) { success comment { id body createdAt user { name } } } }";

pub const PROJECT_CREATE: &str = "mutation ProjectCreate($input: ProjectCreateInput!) { \
    projectCreate(input: $input) { success project { id name state progress targetDate } } }";

pub const PROJECT_UPDATE: &str = "mutation ProjectUpdate($id: String!, $input: ProjectUpdateInput!) { \
    projectUpdate(id: $id, input: $input) { success project { id name state progress targetDate } } }";

pub const PROJECT_DELETE: &str =
    "mutation ProjectDelete($id: String!) { projectDelete(id: $id) { success } }";

pub const LABEL_CREATE: &str = "mutation LabelCreate($input: IssueLabelCreateInput!) { \
    issueLabelCreate(input: $input) { success issueLabel { id name color team { key } } } }";
