//! Matrix expansion - turns a job template into concrete job instances

use crate::core::{
    env::EnvValue,
    job::{AxisValue, ConcreteJob, JobTemplate},
};
use tracing::debug;

/// Expands job templates over their matrix axes
pub struct MatrixExpander;

impl MatrixExpander {
    /// Expand a template into concrete jobs
    ///
    /// Cells are the cross product of the axes in declared order, the last
    /// axis varying fastest. Excluded cells are skipped; every other cell
    /// gets the base env, its axis values, then matching overrides in
    /// declaration order. A template without axes yields exactly one job.
    pub fn expand(template: &JobTemplate) -> Vec<ConcreteJob> {
        let cells = Self::cells(template);
        let total = cells.len();

        let jobs: Vec<ConcreteJob> = cells
            .into_iter()
            .filter(|cell| !template.exclusions.iter().any(|ex| ex.matches(cell)))
            .map(|cell| Self::instantiate(template, cell))
            .collect();

        if jobs.len() < total {
            debug!(
                "Job '{}' in stage '{}': {} of {} matrix cells excluded",
                template.name,
                template.stage,
                total - jobs.len(),
                total
            );
        }

        jobs
    }

    /// Cartesian product of the axis values
    fn cells(template: &JobTemplate) -> Vec<Vec<AxisValue>> {
        let mut cells: Vec<Vec<AxisValue>> = vec![Vec::new()];

        for axis in &template.axes {
            cells = cells
                .into_iter()
                .flat_map(|cell| {
                    axis.values.iter().map(move |value| {
                        let mut next = cell.clone();
                        next.push(AxisValue {
                            axis: axis.name.clone(),
                            value: value.clone(),
                        });
                        next
                    })
                })
                .collect();
        }

        cells
    }

    fn instantiate(template: &JobTemplate, cell: Vec<AxisValue>) -> ConcreteJob {
        let mut env = template.env.clone();
        for coord in &cell {
            env.insert(coord.axis.clone(), EnvValue::plain(coord.value.clone()));
        }
        for matrix_override in &template.overrides {
            if matrix_override.when.matches(&cell) {
                env.extend(matrix_override.env.clone());
            }
        }

        let allow_failure = template.allow_failures.iter().any(|m| m.matches(&cell));

        ConcreteJob {
            number: String::new(),
            stage: template.stage.clone(),
            template: template.name.clone(),
            name: Self::display_name(&template.name, &cell),
            matrix: cell,
            env,
            commands: template.commands.clone(),
            allow_failure,
            deploy: Vec::new(),
        }
    }

    fn display_name(name: &str, cell: &[AxisValue]) -> String {
        if cell.is_empty() {
            return name.to_string();
        }

        let coords: Vec<String> = cell
            .iter()
            .map(|coord| format!("{}={}", coord.axis, coord.value))
            .collect();
        format!("{} ({})", name, coords.join(", "))
    }
}
