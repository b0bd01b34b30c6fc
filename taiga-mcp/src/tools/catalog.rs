//! The tool catalog
//!
//! Builds every REST shim from per-family tables. Within a family the
//! standard shapes repeat (list, get, get-by-alt-key, create, update,
//! delete, bulk variants, vote/watch actions, filters-data, attachments),
//! so generators stamp them out; the handful of one-off endpoints are
//! declared inline.

use std::sync::Arc;

use taiga_client::cached::ttl;
use taiga_client::{CachedClient, HttpMethod};

use crate::error::McpResult;
use crate::registry::ToolRegistry;

use super::management::register_management_tools;
use super::{register_spec, ParamType, ToolSpec};

/// Register the complete catalog: REST shims plus management tools
pub fn register_catalog(registry: &mut ToolRegistry, client: Arc<CachedClient>) -> McpResult<()> {
    let mut specs: Vec<ToolSpec> = Vec::new();

    project_tools(&mut specs);
    for family in WORK_ITEM_FAMILIES {
        work_item_tools(&mut specs, family);
    }
    userstory_order_tools(&mut specs);
    epic_related_tools(&mut specs);
    membership_tools(&mut specs);
    milestone_tools(&mut specs);
    wiki_tools(&mut specs);
    webhook_tools(&mut specs);
    user_tools(&mut specs);
    settings_tools(&mut specs);
    custom_attribute_tools(&mut specs);
    search_tools(&mut specs);

    for spec in specs {
        register_spec(registry, client.clone(), spec)?;
    }

    register_management_tools(registry, client)?;
    Ok(())
}

/// One votable, watchable work-item family sharing the standard shapes
struct WorkItemFamily {
    /// REST path segment, e.g. `userstories`
    path: &'static str,

    /// Singular fragment for tool names, e.g. `user_story`
    singular: &'static str,

    /// Plural fragment for tool names, e.g. `user_stories`
    plural: &'static str,

    /// Human label for descriptions, e.g. `user story`
    label: &'static str,

    /// Tag shared by every tool of the family
    tag: &'static str,

    /// Bulk-create body field, e.g. `bulk_stories`
    bulk_field: &'static str,

    /// Extra optional body fields on create/update beyond the shared set
    extra_fields: &'static [(&'static str, ParamType, &'static str)],
}

const WORK_ITEM_FAMILIES: &[WorkItemFamily] = &[
    WorkItemFamily {
        path: "userstories",
        singular: "user_story",
        plural: "user_stories",
        label: "user story",
        tag: "userstories",
        bulk_field: "bulk_stories",
        extra_fields: &[
            ("milestone", ParamType::Integer, "Sprint (milestone) id"),
            ("points", ParamType::Object, "Role id to point id mapping"),
            ("team_requirement", ParamType::Boolean, "Flag as team requirement"),
            ("client_requirement", ParamType::Boolean, "Flag as client requirement"),
        ],
    },
    WorkItemFamily {
        path: "epics",
        singular: "epic",
        plural: "epics",
        label: "epic",
        tag: "epics",
        bulk_field: "bulk_epics",
        extra_fields: &[("color", ParamType::String, "Epic color as a hex string")],
    },
    WorkItemFamily {
        path: "issues",
        singular: "issue",
        plural: "issues",
        label: "issue",
        tag: "issues",
        bulk_field: "bulk_issues",
        extra_fields: &[
            ("milestone", ParamType::Integer, "Sprint (milestone) id"),
            ("priority", ParamType::Integer, "Priority id"),
            ("severity", ParamType::Integer, "Severity id"),
            ("type", ParamType::Integer, "Issue type id"),
        ],
    },
    WorkItemFamily {
        path: "tasks",
        singular: "task",
        plural: "tasks",
        label: "task",
        tag: "tasks",
        bulk_field: "bulk_tasks",
        extra_fields: &[
            ("milestone", ParamType::Integer, "Sprint (milestone) id"),
            ("user_story", ParamType::Integer, "Parent user story id"),
            ("is_iocaine", ParamType::Boolean, "Flag the task as iocaine"),
        ],
    },
];

fn work_item_tools(specs: &mut Vec<ToolSpec>, f: &WorkItemFamily) {
    // Listings change too often to cache
    specs.push(
        ToolSpec::read(
            &format!("taiga_list_{}", f.plural),
            &format!("List {} items, optionally filtered", f.label),
            &format!("/{}", f.path),
        )
        .tags(&[f.tag, "list"])
        .query("project", ParamType::Integer, false, "Filter by project id")
        .query("milestone", ParamType::Integer, false, "Filter by sprint id")
        .query("status", ParamType::Integer, false, "Filter by status id")
        .query("assigned_to", ParamType::Integer, false, "Filter by assignee user id")
        .query("tags", ParamType::Array, false, "Filter by tags")
        .project_scope("project"),
    );

    specs.push(
        ToolSpec::read(
            &format!("taiga_get_{}", f.singular),
            &format!("Get one {} by id", f.label),
            &format!("/{}/{{id}}", f.path),
        )
        .tags(&[f.tag, "get"])
        .path_i64("id", &format!("{} id", capitalize(f.label)))
        .entity_id("id"),
    );

    specs.push(
        ToolSpec::read(
            &format!("taiga_get_{}_by_ref", f.singular),
            &format!("Get one {} by project and reference number", f.label),
            &format!("/{}/by_ref", f.path),
        )
        .tags(&[f.tag, "get"])
        .query("project", ParamType::Integer, true, "Project id")
        .query("ref", ParamType::Integer, true, "Reference number within the project")
        .project_scope("project"),
    );

    let mut create = ToolSpec::write(
        &format!("taiga_create_{}", f.singular),
        &format!("Create a {} in a project", f.label),
        HttpMethod::Post,
        &format!("/{}", f.path),
    )
    .tags(&[f.tag, "create"])
    .body("project", ParamType::Integer, true, "Project id")
    .body("subject", ParamType::String, true, "Subject line")
    .body("description", ParamType::String, false, "Long description")
    .body("status", ParamType::Integer, false, "Status id")
    .body("assigned_to", ParamType::Integer, false, "Assignee user id")
    .body("tags", ParamType::Array, false, "Tags to attach")
    .project_scope("project");
    for (name, ty, desc) in f.extra_fields {
        create = create.body(name, *ty, false, desc);
    }
    specs.push(create);

    let mut update = ToolSpec::write(
        &format!("taiga_update_{}", f.singular),
        &format!("Update fields of a {}; requires its current version", f.label),
        HttpMethod::Patch,
        &format!("/{}/{{id}}", f.path),
    )
    .tags(&[f.tag, "update"])
    .path_i64("id", &format!("{} id", capitalize(f.label)))
    .body("version", ParamType::Integer, true, "Current version for optimistic concurrency")
    .body("subject", ParamType::String, false, "New subject")
    .body("description", ParamType::String, false, "New description")
    .body("status", ParamType::Integer, false, "New status id")
    .body("assigned_to", ParamType::Integer, false, "New assignee user id")
    .body("tags", ParamType::Array, false, "Replacement tag list")
    .entity_id("id");
    for (name, ty, desc) in f.extra_fields {
        update = update.body(name, *ty, false, desc);
    }
    specs.push(update);

    specs.push(
        ToolSpec::delete(
            &format!("taiga_delete_{}", f.singular),
            &format!("Delete a {}", f.label),
            &format!("/{}/{{id}}", f.path),
        )
        .tags(&[f.tag, "delete"])
        .path_i64("id", &format!("{} id", capitalize(f.label)))
        .entity_id("id"),
    );

    specs.push(
        ToolSpec::write(
            &format!("taiga_bulk_create_{}", f.plural),
            &format!("Create several {} items from one subject per line", f.label),
            HttpMethod::Post,
            &format!("/{}/bulk_create", f.path),
        )
        .tags(&[f.tag, "bulk", "create"])
        .body("project_id", ParamType::Integer, true, "Project id")
        .body(f.bulk_field, ParamType::String, true, "Subjects, one per line")
        .project_scope("project_id"),
    );

    specs.push(
        ToolSpec::cached_read(
            &format!("taiga_get_{}_filters", f.singular),
            &format!("Get the available {} filters for a project", f.label),
            &format!("/{}/filters_data", f.path),
            ttl::FILTERS_DATA,
        )
        .named_endpoint(&format!("{}_filters_data", f.path))
        .tags(&[f.tag, "filters"])
        .query("project", ParamType::Integer, true, "Project id")
        .project_scope("project"),
    );

    for (action, desc) in [
        ("upvote", "Add the caller's vote to"),
        ("downvote", "Withdraw the caller's vote from"),
    ] {
        specs.push(
            ToolSpec::write(
                &format!("taiga_{}_{}", action, f.singular),
                &format!("{} a {}", desc, f.label),
                HttpMethod::Post,
                &format!("/{}/{{id}}/{}", f.path, action),
            )
            .tags(&[f.tag, "votes"])
            .path_i64("id", &format!("{} id", capitalize(f.label)))
            .entity_id("id")
            .idempotent(),
        );
    }

    specs.push(
        ToolSpec::read(
            &format!("taiga_list_{}_voters", f.singular),
            &format!("List users who voted for a {}", f.label),
            &format!("/{}/{{id}}/voters", f.path),
        )
        .tags(&[f.tag, "votes", "list"])
        .path_i64("id", &format!("{} id", capitalize(f.label)))
        .entity_id("id"),
    );

    for (action, desc) in [
        ("watch", "Start watching"),
        ("unwatch", "Stop watching"),
    ] {
        specs.push(
            ToolSpec::write(
                &format!("taiga_{}_{}", action, f.singular),
                &format!("{} a {}", desc, f.label),
                HttpMethod::Post,
                &format!("/{}/{{id}}/{}", f.path, action),
            )
            .tags(&[f.tag, "watchers"])
            .path_i64("id", &format!("{} id", capitalize(f.label)))
            .entity_id("id")
            .idempotent(),
        );
    }

    specs.push(
        ToolSpec::read(
            &format!("taiga_list_{}_watchers", f.singular),
            &format!("List users watching a {}", f.label),
            &format!("/{}/{{id}}/watchers", f.path),
        )
        .tags(&[f.tag, "watchers", "list"])
        .path_i64("id", &format!("{} id", capitalize(f.label)))
        .entity_id("id"),
    );

    specs.push(
        ToolSpec::read(
            &format!("taiga_list_{}_attachments", f.singular),
            &format!("List attachments of a {}", f.label),
            &format!("/{}/attachments", f.path),
        )
        .tags(&[f.tag, "attachments", "list"])
        .query("project", ParamType::Integer, true, "Project id")
        .query("object_id", ParamType::Integer, true, &format!("{} id", capitalize(f.label)))
        .project_scope("project"),
    );

    specs.push(
        ToolSpec::read(
            &format!("taiga_get_{}_attachment", f.singular),
            &format!("Get one {} attachment by id", f.label),
            &format!("/{}/attachments/{{id}}", f.path),
        )
        .tags(&[f.tag, "attachments", "get"])
        .path_i64("id", "Attachment id"),
    );

    specs.push(
        ToolSpec::delete(
            &format!("taiga_delete_{}_attachment", f.singular),
            &format!("Delete a {} attachment", f.label),
            &format!("/{}/attachments/{{id}}", f.path),
        )
        .tags(&[f.tag, "attachments", "delete"])
        .path_i64("id", "Attachment id"),
    );
}

fn userstory_order_tools(specs: &mut Vec<ToolSpec>) {
    for (suffix, desc) in [
        ("backlog_order", "backlog"),
        ("kanban_order", "kanban board"),
        ("sprint_order", "sprint taskboard"),
    ] {
        specs.push(
            ToolSpec::write(
                &format!("taiga_bulk_update_{}", suffix),
                &format!("Reorder user stories on the {}", desc),
                HttpMethod::Post,
                &format!("/userstories/bulk_update_{}", suffix),
            )
            .tags(&["userstories", "bulk", "order"])
            .body("project_id", ParamType::Integer, true, "Project id")
            .body("bulk_stories", ParamType::Array, true, "User story ids in the new order")
            .project_scope("project_id"),
        );
    }

    specs.push(
        ToolSpec::write(
            "taiga_bulk_update_user_story_milestone",
            "Move several user stories into a sprint",
            HttpMethod::Post,
            "/userstories/bulk_update_milestone",
        )
        .tags(&["userstories", "bulk", "milestones"])
        .body("project_id", ParamType::Integer, true, "Project id")
        .body("milestone_id", ParamType::Integer, true, "Target sprint id")
        .body("bulk_stories", ParamType::Array, true, "User story ids to move")
        .project_scope("project_id"),
    );
}

fn epic_related_tools(specs: &mut Vec<ToolSpec>) {
    specs.push(
        ToolSpec::read(
            "taiga_list_epic_related_user_stories",
            "List user stories linked to an epic",
            "/epics/{epic_id}/related_userstories",
        )
        .tags(&["epics", "userstories", "list"])
        .path_i64("epic_id", "Epic id")
        .entity_id("epic_id"),
    );

    specs.push(
        ToolSpec::write(
            "taiga_create_epic_related_user_story",
            "Link an existing user story to an epic",
            HttpMethod::Post,
            "/epics/{epic_id}/related_userstories",
        )
        .tags(&["epics", "userstories", "create"])
        .path_i64("epic_id", "Epic id")
        .body("user_story", ParamType::Integer, true, "User story id to link")
        .entity_id("epic_id"),
    );

    specs.push(
        ToolSpec::write(
            "taiga_bulk_create_epic_related_user_stories",
            "Create and link several user stories to an epic",
            HttpMethod::Post,
            "/epics/{epic_id}/related_userstories/bulk_create",
        )
        .tags(&["epics", "userstories", "bulk", "create"])
        .path_i64("epic_id", "Epic id")
        .body("project_id", ParamType::Integer, true, "Project id")
        .body("bulk_userstories", ParamType::String, true, "Subjects, one per line")
        .project_scope("project_id")
        .entity_id("epic_id"),
    );

    specs.push(
        ToolSpec::delete(
            "taiga_delete_epic_related_user_story",
            "Unlink a user story from an epic",
            "/epics/{epic_id}/related_userstories/{user_story_id}",
        )
        .tags(&["epics", "userstories", "delete"])
        .path_i64("epic_id", "Epic id")
        .path_i64("user_story_id", "Linked user story id")
        .entity_id("epic_id"),
    );
}

fn project_tools(specs: &mut Vec<ToolSpec>) {
    specs.push(
        ToolSpec::read("taiga_list_projects", "List projects visible to the authenticated user", "/projects")
            .tags(&["projects", "list"])
            .query("member", ParamType::Integer, false, "Filter by member user id")
            .query("is_backlog_activated", ParamType::Boolean, false, "Filter by backlog module state")
            .query("is_kanban_activated", ParamType::Boolean, false, "Filter by kanban module state")
            .query("order_by", ParamType::String, false, "Sort key, e.g. total_activity"),
    );

    specs.push(
        ToolSpec::read("taiga_get_project", "Get one project by id", "/projects/{id}")
            .tags(&["projects", "get"])
            .path_i64("id", "Project id")
            .project_scope("id")
            .entity_id("id"),
    );

    specs.push(
        ToolSpec::read("taiga_get_project_by_slug", "Get one project by slug", "/projects/by_slug")
            .tags(&["projects", "get"])
            .query("slug", ParamType::String, true, "Project slug"),
    );

    specs.push(
        ToolSpec::write("taiga_create_project", "Create a project", HttpMethod::Post, "/projects")
            .tags(&["projects", "create"])
            .body("name", ParamType::String, true, "Project name")
            .body("description", ParamType::String, true, "Project description")
            .body("is_private", ParamType::Boolean, false, "Whether the project is private")
            .body("is_backlog_activated", ParamType::Boolean, false, "Enable the backlog module")
            .body("is_kanban_activated", ParamType::Boolean, false, "Enable the kanban module")
            .body("is_wiki_activated", ParamType::Boolean, false, "Enable the wiki module")
            .body("is_issues_activated", ParamType::Boolean, false, "Enable the issues module"),
    );

    specs.push(
        ToolSpec::write("taiga_update_project", "Update project fields", HttpMethod::Patch, "/projects/{id}")
            .tags(&["projects", "update"])
            .path_i64("id", "Project id")
            .body("name", ParamType::String, false, "New name")
            .body("description", ParamType::String, false, "New description")
            .body("is_private", ParamType::Boolean, false, "New privacy flag")
            .project_scope("id")
            .entity_id("id"),
    );

    specs.push(
        ToolSpec::delete("taiga_delete_project", "Delete a project and all its contents", "/projects/{id}")
            .tags(&["projects", "delete"])
            .path_i64("id", "Project id")
            .project_scope("id")
            .entity_id("id"),
    );

    specs.push(
        ToolSpec::cached_read(
            "taiga_get_project_stats",
            "Get burndown-style statistics for a project",
            "/projects/{id}/stats",
            ttl::STATS,
        )
        .named_endpoint("projects_stats")
        .tags(&["projects", "stats"])
        .path_i64("id", "Project id")
        .project_scope("id"),
    );

    specs.push(
        ToolSpec::cached_read(
            "taiga_get_project_issue_stats",
            "Get issue statistics for a project",
            "/projects/{id}/issues_stats",
            ttl::STATS,
        )
        .tags(&["projects", "issues", "stats"])
        .path_i64("id", "Project id")
        .project_scope("id"),
    );

    specs.push(
        ToolSpec::cached_read(
            "taiga_get_project_modules",
            "Get the modules configuration of a project",
            "/projects/{id}/modules",
            ttl::PROJECT_MODULES,
        )
        .named_endpoint("projects_modules")
        .tags(&["projects", "modules"])
        .path_i64("id", "Project id")
        .project_scope("id"),
    );

    specs.push(
        ToolSpec::write(
            "taiga_update_project_modules",
            "Update the modules configuration of a project",
            HttpMethod::Patch,
            "/projects/{id}/modules",
        )
        .tags(&["projects", "modules", "update"])
        .path_i64("id", "Project id")
        .body("modules", ParamType::Object, true, "Module configuration object")
        .project_scope("id")
        .entity_id("id"),
    );

    specs.push(
        ToolSpec::read("taiga_get_project_tags", "Get the tag colors defined in a project", "/projects/{id}/tags_colors")
            .tags(&["projects", "tags"])
            .path_i64("id", "Project id")
            .project_scope("id"),
    );

    specs.push(
        ToolSpec::write("taiga_create_project_tag", "Define a tag in a project", HttpMethod::Post, "/projects/{id}/create_tag")
            .tags(&["projects", "tags", "create"])
            .path_i64("id", "Project id")
            .body("tag", ParamType::String, true, "Tag name")
            .body("color", ParamType::String, false, "Tag color as a hex string")
            .project_scope("id")
            .entity_id("id"),
    );

    specs.push(
        ToolSpec::write("taiga_edit_project_tag", "Rename or recolor a project tag", HttpMethod::Post, "/projects/{id}/edit_tag")
            .tags(&["projects", "tags", "update"])
            .path_i64("id", "Project id")
            .body("from_tag", ParamType::String, true, "Existing tag name")
            .body("to_tag", ParamType::String, false, "New tag name")
            .body("color", ParamType::String, false, "New color as a hex string")
            .project_scope("id")
            .entity_id("id"),
    );

    specs.push(
        ToolSpec::write("taiga_delete_project_tag", "Remove a tag from a project", HttpMethod::Post, "/projects/{id}/delete_tag")
            .tags(&["projects", "tags", "delete"])
            .path_i64("id", "Project id")
            .body("tag", ParamType::String, true, "Tag name to remove")
            .project_scope("id")
            .entity_id("id"),
    );

    for (action, desc) in [("like", "Like"), ("unlike", "Remove the like from")] {
        specs.push(
            ToolSpec::write(
                &format!("taiga_{}_project", action),
                &format!("{} a project", desc),
                HttpMethod::Post,
                &format!("/projects/{{id}}/{}", action),
            )
            .tags(&["projects", "likes"])
            .path_i64("id", "Project id")
            .project_scope("id")
            .entity_id("id")
            .idempotent(),
        );
    }

    specs.push(
        ToolSpec::read("taiga_list_project_fans", "List users who liked a project", "/projects/{id}/fans")
            .tags(&["projects", "likes", "list"])
            .path_i64("id", "Project id")
            .project_scope("id"),
    );

    for (action, desc) in [("watch", "Start watching"), ("unwatch", "Stop watching")] {
        specs.push(
            ToolSpec::write(
                &format!("taiga_{}_project", action),
                &format!("{} a project", desc),
                HttpMethod::Post,
                &format!("/projects/{{id}}/{}", action),
            )
            .tags(&["projects", "watchers"])
            .path_i64("id", "Project id")
            .project_scope("id")
            .entity_id("id")
            .idempotent(),
        );
    }

    specs.push(
        ToolSpec::read("taiga_list_project_watchers", "List users watching a project", "/projects/{id}/watchers")
            .tags(&["projects", "watchers", "list"])
            .path_i64("id", "Project id")
            .project_scope("id"),
    );

    specs.push(
        ToolSpec::write("taiga_duplicate_project", "Duplicate a project with selected members", HttpMethod::Post, "/projects/{id}/duplicate")
            .tags(&["projects", "create"])
            .path_i64("id", "Project id to duplicate")
            .body("name", ParamType::String, true, "Name of the new project")
            .body("description", ParamType::String, true, "Description of the new project")
            .body("is_private", ParamType::Boolean, false, "Whether the new project is private")
            .body("users", ParamType::Array, false, "User ids to keep as members"),
    );

    specs.push(
        ToolSpec::read("taiga_get_project_timeline", "Get the activity timeline of a project", "/timeline/project/{id}")
            .tags(&["projects", "timeline"])
            .path_i64("id", "Project id")
            .query("page", ParamType::Integer, false, "Page number")
            .project_scope("id"),
    );
}

fn membership_tools(specs: &mut Vec<ToolSpec>) {
    specs.push(
        ToolSpec::cached_read("taiga_list_memberships", "List memberships of a project", "/memberships", ttl::MEMBERSHIPS)
            .named_endpoint("memberships_list")
            .tags(&["memberships", "list"])
            .query("project", ParamType::Integer, true, "Project id")
            .project_scope("project"),
    );

    specs.push(
        ToolSpec::read("taiga_get_membership", "Get one membership by id", "/memberships/{id}")
            .tags(&["memberships", "get"])
            .path_i64("id", "Membership id")
            .entity_id("id"),
    );

    specs.push(
        ToolSpec::write("taiga_create_membership", "Invite a user to a project", HttpMethod::Post, "/memberships")
            .tags(&["memberships", "create"])
            .body("project", ParamType::Integer, true, "Project id")
            .body("role", ParamType::Integer, true, "Role id")
            .body("username", ParamType::String, true, "Username or email to invite")
            .project_scope("project"),
    );

    specs.push(
        ToolSpec::write("taiga_bulk_create_memberships", "Invite several users to a project", HttpMethod::Post, "/memberships/bulk_create")
            .tags(&["memberships", "bulk", "create"])
            .body("project_id", ParamType::Integer, true, "Project id")
            .body("bulk_memberships", ParamType::Array, true, "Objects with role_id and username")
            .project_scope("project_id"),
    );

    specs.push(
        ToolSpec::write("taiga_update_membership", "Change the role of a membership", HttpMethod::Patch, "/memberships/{id}")
            .tags(&["memberships", "update"])
            .path_i64("id", "Membership id")
            .body("role", ParamType::Integer, true, "New role id")
            .entity_id("id"),
    );

    specs.push(
        ToolSpec::delete("taiga_delete_membership", "Remove a member from a project", "/memberships/{id}")
            .tags(&["memberships", "delete"])
            .path_i64("id", "Membership id")
            .entity_id("id"),
    );

    specs.push(
        ToolSpec::write("taiga_resend_membership_invitation", "Resend a pending membership invitation", HttpMethod::Post, "/memberships/{id}/resend_invitation")
            .tags(&["memberships", "invitations"])
            .path_i64("id", "Membership id")
            .entity_id("id"),
    );
}

fn milestone_tools(specs: &mut Vec<ToolSpec>) {
    specs.push(
        ToolSpec::read("taiga_list_milestones", "List sprints (milestones) of a project", "/milestones")
            .tags(&["milestones", "list"])
            .query("project", ParamType::Integer, true, "Project id")
            .query("closed", ParamType::Boolean, false, "Filter by closed state")
            .project_scope("project"),
    );

    specs.push(
        ToolSpec::read("taiga_get_milestone", "Get one sprint by id", "/milestones/{id}")
            .tags(&["milestones", "get"])
            .path_i64("id", "Sprint id")
            .entity_id("id"),
    );

    specs.push(
        ToolSpec::write("taiga_create_milestone", "Create a sprint in a project", HttpMethod::Post, "/milestones")
            .tags(&["milestones", "create"])
            .body("project", ParamType::Integer, true, "Project id")
            .body("name", ParamType::String, true, "Sprint name")
            .body("estimated_start", ParamType::String, true, "Start date (YYYY-MM-DD)")
            .body("estimated_finish", ParamType::String, true, "Finish date (YYYY-MM-DD)")
            .project_scope("project"),
    );

    specs.push(
        ToolSpec::write("taiga_update_milestone", "Update a sprint", HttpMethod::Patch, "/milestones/{id}")
            .tags(&["milestones", "update"])
            .path_i64("id", "Sprint id")
            .body("name", ParamType::String, false, "New name")
            .body("estimated_start", ParamType::String, false, "New start date (YYYY-MM-DD)")
            .body("estimated_finish", ParamType::String, false, "New finish date (YYYY-MM-DD)")
            .entity_id("id"),
    );

    specs.push(
        ToolSpec::delete("taiga_delete_milestone", "Delete a sprint", "/milestones/{id}")
            .tags(&["milestones", "delete"])
            .path_i64("id", "Sprint id")
            .entity_id("id"),
    );

    specs.push(
        ToolSpec::cached_read(
            "taiga_get_milestone_stats",
            "Get burndown statistics for a sprint",
            "/milestones/{id}/stats",
            ttl::STATS,
        )
        .tags(&["milestones", "stats"])
        .path_i64("id", "Sprint id"),
    );

    for (action, desc) in [("watch", "Start watching"), ("unwatch", "Stop watching")] {
        specs.push(
            ToolSpec::write(
                &format!("taiga_{}_milestone", action),
                &format!("{} a sprint", desc),
                HttpMethod::Post,
                &format!("/milestones/{{id}}/{}", action),
            )
            .tags(&["milestones", "watchers"])
            .path_i64("id", "Sprint id")
            .entity_id("id")
            .idempotent(),
        );
    }

    specs.push(
        ToolSpec::read("taiga_list_milestone_watchers", "List users watching a sprint", "/milestones/{id}/watchers")
            .tags(&["milestones", "watchers", "list"])
            .path_i64("id", "Sprint id")
            .entity_id("id"),
    );
}

fn wiki_tools(specs: &mut Vec<ToolSpec>) {
    specs.push(
        ToolSpec::read("taiga_list_wiki_pages", "List wiki pages of a project", "/wiki")
            .tags(&["wiki", "list"])
            .query("project", ParamType::Integer, true, "Project id")
            .project_scope("project"),
    );

    specs.push(
        ToolSpec::read("taiga_get_wiki_page", "Get one wiki page by id", "/wiki/{id}")
            .tags(&["wiki", "get"])
            .path_i64("id", "Wiki page id")
            .entity_id("id"),
    );

    specs.push(
        ToolSpec::read("taiga_get_wiki_page_by_slug", "Get one wiki page by project and slug", "/wiki/by_slug")
            .tags(&["wiki", "get"])
            .query("project", ParamType::Integer, true, "Project id")
            .query("slug", ParamType::String, true, "Page slug")
            .project_scope("project"),
    );

    specs.push(
        ToolSpec::write("taiga_create_wiki_page", "Create a wiki page", HttpMethod::Post, "/wiki")
            .tags(&["wiki", "create"])
            .body("project", ParamType::Integer, true, "Project id")
            .body("slug", ParamType::String, true, "Page slug")
            .body("content", ParamType::String, true, "Page content in markdown")
            .project_scope("project"),
    );

    specs.push(
        ToolSpec::write("taiga_update_wiki_page", "Update a wiki page", HttpMethod::Patch, "/wiki/{id}")
            .tags(&["wiki", "update"])
            .path_i64("id", "Wiki page id")
            .body("version", ParamType::Integer, true, "Current version for optimistic concurrency")
            .body("content", ParamType::String, false, "New content in markdown")
            .entity_id("id"),
    );

    specs.push(
        ToolSpec::delete("taiga_delete_wiki_page", "Delete a wiki page", "/wiki/{id}")
            .tags(&["wiki", "delete"])
            .path_i64("id", "Wiki page id")
            .entity_id("id"),
    );

    for (action, desc) in [("watch", "Start watching"), ("unwatch", "Stop watching")] {
        specs.push(
            ToolSpec::write(
                &format!("taiga_{}_wiki_page", action),
                &format!("{} a wiki page", desc),
                HttpMethod::Post,
                &format!("/wiki/{{id}}/{}", action),
            )
            .tags(&["wiki", "watchers"])
            .path_i64("id", "Wiki page id")
            .entity_id("id")
            .idempotent(),
        );
    }

    specs.push(
        ToolSpec::read("taiga_list_wiki_page_watchers", "List users watching a wiki page", "/wiki/{id}/watchers")
            .tags(&["wiki", "watchers", "list"])
            .path_i64("id", "Wiki page id")
            .entity_id("id"),
    );

    specs.push(
        ToolSpec::read("taiga_list_wiki_links", "List wiki link entries of a project", "/wiki-links")
            .tags(&["wiki", "links", "list"])
            .query("project", ParamType::Integer, true, "Project id")
            .project_scope("project"),
    );

    specs.push(
        ToolSpec::write("taiga_create_wiki_link", "Add a page to the wiki link list", HttpMethod::Post, "/wiki-links")
            .tags(&["wiki", "links", "create"])
            .body("project", ParamType::Integer, true, "Project id")
            .body("title", ParamType::String, true, "Link title")
            .body("href", ParamType::String, true, "Target page slug")
            .project_scope("project"),
    );

    specs.push(
        ToolSpec::read("taiga_get_wiki_link", "Get one wiki link by id", "/wiki-links/{id}")
            .tags(&["wiki", "links", "get"])
            .path_i64("id", "Wiki link id"),
    );

    specs.push(
        ToolSpec::delete("taiga_delete_wiki_link", "Remove a page from the wiki link list", "/wiki-links/{id}")
            .tags(&["wiki", "links", "delete"])
            .path_i64("id", "Wiki link id"),
    );

    specs.push(
        ToolSpec::read("taiga_list_wiki_attachments", "List attachments of a wiki page", "/wiki/attachments")
            .tags(&["wiki", "attachments", "list"])
            .query("project", ParamType::Integer, true, "Project id")
            .query("object_id", ParamType::Integer, true, "Wiki page id")
            .project_scope("project"),
    );

    specs.push(
        ToolSpec::delete("taiga_delete_wiki_attachment", "Delete a wiki attachment", "/wiki/attachments/{id}")
            .tags(&["wiki", "attachments", "delete"])
            .path_i64("id", "Attachment id"),
    );
}

fn webhook_tools(specs: &mut Vec<ToolSpec>) {
    specs.push(
        ToolSpec::read("taiga_list_webhooks", "List webhooks of a project", "/webhooks")
            .tags(&["webhooks", "list"])
            .query("project", ParamType::Integer, true, "Project id")
            .project_scope("project"),
    );

    specs.push(
        ToolSpec::read("taiga_get_webhook", "Get one webhook by id", "/webhooks/{id}")
            .tags(&["webhooks", "get"])
            .path_i64("id", "Webhook id")
            .entity_id("id"),
    );

    specs.push(
        ToolSpec::write("taiga_create_webhook", "Register a webhook on a project", HttpMethod::Post, "/webhooks")
            .tags(&["webhooks", "create"])
            .body("project", ParamType::Integer, true, "Project id")
            .body("name", ParamType::String, true, "Webhook name")
            .body("url", ParamType::String, true, "Destination URL")
            .body("key", ParamType::String, true, "Secret key used to sign payloads")
            .project_scope("project"),
    );

    specs.push(
        ToolSpec::write("taiga_update_webhook", "Update a webhook", HttpMethod::Patch, "/webhooks/{id}")
            .tags(&["webhooks", "update"])
            .path_i64("id", "Webhook id")
            .body("name", ParamType::String, false, "New name")
            .body("url", ParamType::String, false, "New destination URL")
            .body("key", ParamType::String, false, "New signing key")
            .entity_id("id"),
    );

    specs.push(
        ToolSpec::delete("taiga_delete_webhook", "Delete a webhook", "/webhooks/{id}")
            .tags(&["webhooks", "delete"])
            .path_i64("id", "Webhook id")
            .entity_id("id"),
    );

    specs.push(
        ToolSpec::write("taiga_test_webhook", "Send a test payload through a webhook", HttpMethod::Post, "/webhooks/{id}/test")
            .tags(&["webhooks", "test"])
            .path_i64("id", "Webhook id")
            .entity_id("id")
            .idempotent(),
    );

    specs.push(
        ToolSpec::read("taiga_list_webhook_logs", "List delivery logs of a webhook", "/webhooklogs")
            .tags(&["webhooks", "logs", "list"])
            .query("webhook", ParamType::Integer, true, "Webhook id"),
    );

    specs.push(
        ToolSpec::read("taiga_get_webhook_log", "Get one webhook delivery log", "/webhooklogs/{id}")
            .tags(&["webhooks", "logs", "get"])
            .path_i64("id", "Webhook log id"),
    );

    specs.push(
        ToolSpec::write("taiga_resend_webhook_log", "Resend a webhook delivery", HttpMethod::Post, "/webhooklogs/{id}/resend")
            .tags(&["webhooks", "logs"])
            .path_i64("id", "Webhook log id"),
    );
}

fn user_tools(specs: &mut Vec<ToolSpec>) {
    specs.push(
        ToolSpec::read("taiga_list_users", "List users visible to the caller", "/users")
            .tags(&["users", "list"])
            .query("project", ParamType::Integer, false, "Restrict to members of this project")
            .project_scope("project"),
    );

    specs.push(
        ToolSpec::read("taiga_get_user", "Get one user by id", "/users/{id}")
            .tags(&["users", "get"])
            .path_i64("id", "User id"),
    );

    specs.push(
        ToolSpec::cached_read("taiga_get_me", "Get the authenticated user's profile", "/users/me", ttl::CURRENT_USER)
            .named_endpoint("users_me")
            .tags(&["users", "me"]),
    );

    specs.push(
        ToolSpec::write("taiga_update_user", "Update a user's profile fields", HttpMethod::Patch, "/users/{id}")
            .tags(&["users", "update"])
            .path_i64("id", "User id")
            .body("full_name", ParamType::String, false, "New full name")
            .body("bio", ParamType::String, false, "New biography"),
    );

    specs.push(
        ToolSpec::read("taiga_get_user_stats", "Get contribution statistics for a user", "/users/{id}/stats")
            .tags(&["users", "stats"])
            .path_i64("id", "User id"),
    );

    for (suffix, desc) in [
        ("watched", "content the user watches"),
        ("liked", "projects the user liked"),
        ("voted", "items the user voted for"),
    ] {
        specs.push(
            ToolSpec::read(
                &format!("taiga_get_user_{}", suffix),
                &format!("List {}", desc),
                &format!("/users/{{id}}/{}", suffix),
            )
            .tags(&["users", suffix])
            .path_i64("id", "User id")
            .query("type", ParamType::String, false, "Restrict to one content type")
            .query("q", ParamType::String, false, "Text filter"),
        );
    }

    specs.push(
        ToolSpec::read("taiga_get_user_timeline", "Get the activity timeline of a user", "/timeline/user/{id}")
            .named_endpoint("timeline_user")
            .tags(&["users", "timeline"])
            .path_i64("id", "User id")
            .query("page", ParamType::Integer, false, "Page number"),
    );
}

/// Project-settings kinds sharing the list/get/create/update/delete shape
const SETTINGS_KINDS: &[(&str, &str, &str, &str)] = &[
    // (path, singular, plural, label)
    ("points", "point", "points", "story point scale entry"),
    ("userstory-statuses", "user_story_status", "user_story_statuses", "user story status"),
    ("task-statuses", "task_status", "task_statuses", "task status"),
    ("issue-statuses", "issue_status", "issue_statuses", "issue status"),
    ("epic-statuses", "epic_status", "epic_statuses", "epic status"),
    ("priorities", "priority", "priorities", "issue priority"),
    ("severities", "severity", "severities", "issue severity"),
    ("issue-types", "issue_type", "issue_types", "issue type"),
    ("roles", "role", "roles", "project role"),
];

fn settings_tools(specs: &mut Vec<ToolSpec>) {
    for (path, singular, plural, label) in SETTINGS_KINDS {
        specs.push(
            ToolSpec::read(
                &format!("taiga_list_{}", plural),
                &format!("List every {} of a project", label),
                &format!("/{}", path),
            )
            .tags(&["settings", plural, "list"])
            .query("project", ParamType::Integer, true, "Project id")
            .project_scope("project"),
        );

        specs.push(
            ToolSpec::read(
                &format!("taiga_get_{}", singular),
                &format!("Get one {} by id", label),
                &format!("/{}/{{id}}", path),
            )
            .tags(&["settings", plural, "get"])
            .path_i64("id", &format!("{} id", capitalize(label))),
        );

        specs.push(
            ToolSpec::write(
                &format!("taiga_create_{}", singular),
                &format!("Create a {} in a project", label),
                HttpMethod::Post,
                &format!("/{}", path),
            )
            .tags(&["settings", plural, "create"])
            .body("project", ParamType::Integer, true, "Project id")
            .body("name", ParamType::String, true, "Display name")
            .body("order", ParamType::Integer, false, "Sort order")
            .body("color", ParamType::String, false, "Color as a hex string")
            .project_scope("project"),
        );

        specs.push(
            ToolSpec::write(
                &format!("taiga_update_{}", singular),
                &format!("Update a {}", label),
                HttpMethod::Patch,
                &format!("/{}/{{id}}", path),
            )
            .tags(&["settings", plural, "update"])
            .path_i64("id", &format!("{} id", capitalize(label)))
            .body("name", ParamType::String, false, "New display name")
            .body("order", ParamType::Integer, false, "New sort order")
            .body("color", ParamType::String, false, "New color as a hex string")
            .entity_id("id"),
        );

        specs.push(
            ToolSpec::delete(
                &format!("taiga_delete_{}", singular),
                &format!("Delete a {}", label),
                &format!("/{}/{{id}}", path),
            )
            .tags(&["settings", plural, "delete"])
            .path_i64("id", &format!("{} id", capitalize(label)))
            .entity_id("id"),
        );
    }
}

/// Custom-attribute kinds per work-item family
const CUSTOM_ATTRIBUTE_KINDS: &[(&str, &str, &str)] = &[
    // (attribute path, values path, fragment)
    ("userstory-custom-attributes", "userstories/custom-attributes-values", "user_story"),
    ("task-custom-attributes", "tasks/custom-attributes-values", "task"),
    ("issue-custom-attributes", "issues/custom-attributes-values", "issue"),
    ("epic-custom-attributes", "epics/custom-attributes-values", "epic"),
];

fn custom_attribute_tools(specs: &mut Vec<ToolSpec>) {
    for (attr_path, values_path, fragment) in CUSTOM_ATTRIBUTE_KINDS {
        let label = fragment.replace('_', " ");

        specs.push(
            ToolSpec::read(
                &format!("taiga_list_{}_custom_attributes", fragment),
                &format!("List the custom attributes defined for {} items", label),
                &format!("/{}", attr_path),
            )
            .tags(&["custom-attributes", fragment, "list"])
            .query("project", ParamType::Integer, true, "Project id")
            .project_scope("project"),
        );

        specs.push(
            ToolSpec::write(
                &format!("taiga_create_{}_custom_attribute", fragment),
                &format!("Define a custom attribute for {} items", label),
                HttpMethod::Post,
                &format!("/{}", attr_path),
            )
            .tags(&["custom-attributes", fragment, "create"])
            .body("project", ParamType::Integer, true, "Project id")
            .body("name", ParamType::String, true, "Attribute name")
            .body("description", ParamType::String, false, "Attribute description")
            .body("type", ParamType::String, false, "Field type: text, multiline, richtext, date, url, dropdown, checkbox, number")
            .body("extra", ParamType::Array, false, "Dropdown choices when type is dropdown")
            .project_scope("project"),
        );

        specs.push(
            ToolSpec::write(
                &format!("taiga_update_{}_custom_attribute", fragment),
                &format!("Update a custom attribute of {} items", label),
                HttpMethod::Patch,
                &format!("/{}/{{id}}", attr_path),
            )
            .tags(&["custom-attributes", fragment, "update"])
            .path_i64("id", "Custom attribute id")
            .body("name", ParamType::String, false, "New name")
            .body("description", ParamType::String, false, "New description")
            .entity_id("id"),
        );

        specs.push(
            ToolSpec::delete(
                &format!("taiga_delete_{}_custom_attribute", fragment),
                &format!("Delete a custom attribute of {} items", label),
                &format!("/{}/{{id}}", attr_path),
            )
            .tags(&["custom-attributes", fragment, "delete"])
            .path_i64("id", "Custom attribute id")
            .entity_id("id"),
        );

        specs.push(
            ToolSpec::read(
                &format!("taiga_get_{}_custom_attribute_values", fragment),
                &format!("Get the custom attribute values of one {}", label),
                &format!("/{}/{{id}}", values_path),
            )
            .tags(&["custom-attributes", fragment, "get"])
            .path_i64("id", &format!("{} id", capitalize(&label)))
            .entity_id("id"),
        );

        specs.push(
            ToolSpec::write(
                &format!("taiga_update_{}_custom_attribute_values", fragment),
                &format!("Update the custom attribute values of one {}", label),
                HttpMethod::Patch,
                &format!("/{}/{{id}}", values_path),
            )
            .tags(&["custom-attributes", fragment, "update"])
            .path_i64("id", &format!("{} id", capitalize(&label)))
            .body("version", ParamType::Integer, true, "Current version for optimistic concurrency")
            .body("attributes_values", ParamType::Object, true, "Attribute id to value mapping")
            .entity_id("id"),
        );
    }
}

fn search_tools(specs: &mut Vec<ToolSpec>) {
    specs.push(
        ToolSpec::read("taiga_search", "Full-text search across a project", "/search")
            .tags(&["search"])
            .query("project", ParamType::Integer, true, "Project id")
            .query("text", ParamType::String, true, "Search text")
            .query("get_all", ParamType::Boolean, false, "Return all result kinds")
            .project_scope("project"),
    );
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use taiga_client::{AuthManager, Credentials, MockTransport, TaigaClient};
    use taiga_config::CacheConfig;

    fn cached_client() -> Arc<CachedClient> {
        let mock = Arc::new(MockTransport::new());
        let auth = Arc::new(AuthManager::new(
            mock.clone(),
            Credentials::StaticToken("t".to_string()),
            Duration::from_secs(300),
        ));
        let client = Arc::new(TaigaClient::new(mock, auth));
        Arc::new(CachedClient::new(client, &CacheConfig::default()))
    }

    fn full_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        register_catalog(&mut registry, cached_client()).unwrap();
        registry
    }

    #[test]
    fn test_catalog_size_and_uniqueness() {
        let registry = full_registry();
        // Uniqueness is enforced by register(); size tracks the catalog
        assert!(registry.len() >= 200, "catalog has {} tools", registry.len());
    }

    #[test]
    fn test_all_names_are_prefixed_snake_case() {
        let registry = full_registry();
        for descriptor in registry.descriptors() {
            assert!(
                descriptor.name.starts_with("taiga_"),
                "{} lacks prefix",
                descriptor.name
            );
            assert!(
                descriptor
                    .name
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
                "{} is not snake_case",
                descriptor.name
            );
        }
    }

    #[test]
    fn test_every_tool_has_description_and_schema() {
        let registry = full_registry();
        for descriptor in registry.descriptors() {
            assert!(!descriptor.description.is_empty(), "{}", descriptor.name);
            assert_eq!(descriptor.input_schema["type"], "object", "{}", descriptor.name);
        }
    }

    #[test]
    fn test_deletes_are_destructive_and_not_idempotent() {
        let registry = full_registry();
        let delete = registry.get("taiga_delete_project").unwrap();
        assert!(delete.destructive());
        assert!(!delete.idempotent());
        assert!(!delete.read_only());

        let get = registry.get("taiga_get_project").unwrap();
        assert!(!get.destructive());
        assert!(get.idempotent());
        assert!(get.read_only());
    }

    #[test]
    fn test_expected_families_are_present() {
        let registry = full_registry();
        for name in [
            "taiga_list_projects",
            "taiga_list_user_stories",
            "taiga_get_user_story_by_ref",
            "taiga_bulk_create_user_stories",
            "taiga_bulk_update_backlog_order",
            "taiga_list_epics",
            "taiga_bulk_create_epic_related_user_stories",
            "taiga_list_issues",
            "taiga_list_tasks",
            "taiga_list_milestones",
            "taiga_get_milestone_stats",
            "taiga_list_wiki_pages",
            "taiga_get_wiki_page_by_slug",
            "taiga_list_webhooks",
            "taiga_test_webhook",
            "taiga_list_memberships",
            "taiga_list_users",
            "taiga_get_me",
            "taiga_get_user_timeline",
            "taiga_list_user_story_statuses",
            "taiga_list_priorities",
            "taiga_list_roles",
            "taiga_list_issue_custom_attributes",
            "taiga_update_epic_custom_attribute_values",
            "taiga_search",
            "taiga_cache_stats",
            "taiga_cache_clear",
            "taiga_auth_status",
            "taiga_login",
        ] {
            assert!(registry.get(name).is_some(), "missing tool: {}", name);
        }
    }

    #[test]
    fn test_cached_reads_share_policy_endpoint_names() {
        let registry = full_registry();
        // These tools must hit the same cache keys as the typed client
        // helpers used by resources
        assert!(registry.get("taiga_get_me").is_some());
        assert!(registry.get("taiga_get_project_stats").is_some());
        assert!(registry.get("taiga_get_project_modules").is_some());
    }
}
