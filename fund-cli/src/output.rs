//! Plain-text rendering of API records for the terminal.

use std::io::{self, Write};

use fund_core::{
    Campaign, Cause, Paginated, Project, ProjectBeneficiary, UserProfile, normalize_causes,
};

use crate::utils::or_dash;

pub fn write_project_page<W: Write>(
    out: &mut W,
    page: &Paginated<Project>,
) -> io::Result<()> {
    if page.results.is_empty() {
        writeln!(out, "No projects found.")?;
    } else {
        writeln!(
            out,
            "{:>5}  {:<28} {:<10} {:>12}  {:<16} {}",
            "ID", "NAME", "STATUS", "TARGET", "CITY", "CAUSES"
        )?;
        for project in &page.results {
            writeln!(
                out,
                "{:>5}  {:<28} {:<10} {:>12}  {:<16} {}",
                project.id,
                project.name,
                project.status.as_str(),
                project.target,
                or_dash(project.city.as_deref()),
                normalize_causes(&project.causes).join(", ")
            )?;
        }
    }
    writeln!(
        out,
        "Page {} of {} ({} projects, {} per page)",
        page.current_page(),
        page.total_pages().max(1),
        page.count,
        page.limit
    )
}

pub fn write_project_detail<W: Write>(
    out: &mut W,
    project: &Project,
    campaigns: &[Campaign],
    beneficiaries: &[ProjectBeneficiary],
) -> io::Result<()> {
    let causes = normalize_causes(&project.causes).join(", ");
    let limit = project.campaign_limit.map(|l| l.to_string());

    writeln!(out, "Project #{}: {}", project.id, project.name)?;
    writeln!(out, "  Status:         {}", project.status)?;
    writeln!(out, "  Target:         {}", project.target)?;
    writeln!(out, "  Raised:         {}%", project.donation_percentage)?;
    writeln!(out, "  Causes:         {}", or_dash(Some(causes.as_str())))?;
    writeln!(out, "  City:           {}", or_dash(project.city.as_deref()))?;
    writeln!(out, "  Country:        {}", or_dash(project.country.as_deref()))?;
    writeln!(out, "  Campaign limit: {}", or_dash(limit.as_deref()))?;
    writeln!(out, "  Description:    {}", or_dash(project.description.as_deref()))?;

    writeln!(out, "Campaigns ({}):", campaigns.len())?;
    for campaign in campaigns {
        let ends = campaign
            .end_date
            .map(|d| d.format("%Y-%m-%d").to_string());
        writeln!(
            out,
            "  #{} {} - {} {} (ends {})",
            campaign.id,
            campaign.title,
            campaign.target,
            campaign.target_currency,
            or_dash(ends.as_deref())
        )?;
    }

    writeln!(out, "Beneficiaries ({}):", beneficiaries.len())?;
    for beneficiary in beneficiaries {
        writeln!(
            out,
            "  {} #{} {}",
            beneficiary.kind(),
            beneficiary.assignable_id(),
            beneficiary.display_name()
        )?;
    }
    Ok(())
}

pub fn write_causes<W: Write>(
    out: &mut W,
    causes: &[Cause],
) -> io::Result<()> {
    if causes.is_empty() {
        return writeln!(out, "No causes found.");
    }
    for cause in causes {
        writeln!(
            out,
            "{:>5}  {:<20} {}",
            cause.id,
            cause.name,
            or_dash(cause.description.as_deref())
        )?;
    }
    Ok(())
}

pub fn write_cause<W: Write>(
    out: &mut W,
    cause: &Cause,
) -> io::Result<()> {
    writeln!(out, "Cause #{}: {}", cause.id, cause.name)?;
    writeln!(out, "  Description: {}", or_dash(cause.description.as_deref()))?;
    writeln!(out, "  Icon:        {}", or_dash(cause.icon.as_deref()))
}

pub fn write_user<W: Write>(
    out: &mut W,
    user: &UserProfile,
) -> io::Result<()> {
    writeln!(out, "{user}")
}
