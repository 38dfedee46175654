//! `Accept` header negotiation.

struct Part<'a> {
    kind: &'a str,
    subtype: &'a str,
    q: f32,
    index: usize,
}

/// Pick the entry of `types` the client prefers, if any is acceptable.
///
/// Higher q-values win; on ties concrete subtypes beat `*`, concrete types
/// beat `*`, then header order decides.
pub fn negotiate<'t>(accept: &str, types: &[&'t str]) -> Option<&'t str> {
    let mut parts: Vec<Part<'_>> = accept
        .split(',')
        .enumerate()
        .filter_map(|(index, entry)| parse_part(entry, index))
        .collect();

    parts.sort_by(|a, b| {
        b.q.total_cmp(&a.q)
            .then_with(|| (a.subtype == "*").cmp(&(b.subtype == "*")))
            .then_with(|| (a.kind == "*").cmp(&(b.kind == "*")))
            .then_with(|| a.index.cmp(&b.index))
    });

    let mut accepted = None;
    let mut min_priority = usize::MAX;

    for mimetype in types {
        let (kind, subtype) = mimetype.split_once('/').unwrap_or((mimetype, ""));
        let priority = parts.iter().position(|part| {
            (part.kind == kind || part.kind == "*") && (part.subtype == subtype || part.subtype == "*")
        });

        if let Some(priority) = priority {
            if priority < min_priority {
                accepted = Some(*mimetype);
                min_priority = priority;
            }
        }
    }

    accepted
}

fn parse_part(entry: &str, index: usize) -> Option<Part<'_>> {
    let mut params = entry.split(';');
    let (kind, subtype) = params.next()?.trim().split_once('/')?;
    if kind.is_empty() || subtype.is_empty() {
        return None;
    }

    let q = params
        .filter_map(|p| p.trim().strip_prefix("q="))
        .find_map(|q| q.parse::<f32>().ok())
        .unwrap_or(1.0);

    Some(Part {
        kind,
        subtype,
        q,
        index,
    })
}
