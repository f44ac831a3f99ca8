use crate::complete::CompleteSparql;
use crate::environment::MappingEnvironment;
use crate::error::QueryError;
use crate::mapping::{Mapping, Mappings};
use crate::producer::Producer;
use kgram_model::Node;
use rustc_hash::FxHashMap;

/// Replaces the completed solutions by one solution per group.
///
/// Groups are formed by the `GROUP BY` keys computed during completion and keep the order in
/// which they were first seen. Without `GROUP BY`, all solutions form a single group, even if
/// there are none. Each group is represented by its first solution, extended by the select
/// expressions evaluated over the group and filtered by `HAVING`.
pub(super) fn group(
    complete: &CompleteSparql<'_>,
    producer: &Producer,
    mappings: &mut Mappings,
) -> Result<(), QueryError> {
    let query = complete.query();
    let solutions = mappings.take();

    let groups = if query.group_by().is_empty() {
        vec![solutions]
    } else {
        let mut index = FxHashMap::<Vec<Option<Node>>, usize>::default();
        let mut groups = Vec::<Vec<Mapping>>::new();
        for solution in solutions {
            let next = groups.len();
            let group = *index
                .entry(solution.group_by().to_vec())
                .or_insert(next);
            if group == next {
                groups.push(Vec::new());
            }
            groups[group].push(solution);
        }
        groups
    };

    'groups: for group in groups {
        let representative = group
            .first()
            .cloned()
            .unwrap_or_else(|| Mapping::unbound(query.variables().len()));
        let Some(mut mapping) = complete.select(representative, Some(&group), producer)? else {
            continue;
        };
        for having in query.having() {
            let mut env = MappingEnvironment::grouped(query, &mapping, &group);
            if !complete.interpreter().test(having, &mut env, producer)? {
                continue 'groups;
            }
        }
        complete.keys(&mut mapping, Some(&group), producer)?;
        mappings.submit(mapping);
    }
    Ok(())
}
