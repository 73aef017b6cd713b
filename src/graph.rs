use crate::error::GraphError;
use crate::model::DataSourceRequest;
use ahash::AHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Dependency graph over a set of requests. An edge `a -> b` means `a` reads from
/// the response of `b`, so `b` must run first.
pub struct RequestGraph<'a> {
    requests: &'a [DataSourceRequest],
    index: AHashMap<&'a str, usize>,
    dependencies: Vec<Vec<usize>>,
}

impl<'a> RequestGraph<'a> {
    /// Builds the graph, rejecting duplicate ids and references to unknown requests.
    pub fn build(requests: &'a [DataSourceRequest]) -> Result<Self, GraphError> {
        let mut index = AHashMap::with_capacity(requests.len());
        for (i, request) in requests.iter().enumerate() {
            if index.insert(request.id.as_str(), i).is_some() {
                return Err(GraphError::DuplicateRequestId(request.id.clone()));
            }
        }

        let mut dependencies = Vec::with_capacity(requests.len());
        for request in requests {
            let mut deps = Vec::new();
            for referenced in request.references() {
                let dep = *index.get(referenced.as_str()).ok_or_else(|| {
                    GraphError::UnknownRequest {
                        referrer: request.id.clone(),
                        referenced: referenced.clone(),
                    }
                })?;
                deps.push(dep);
            }
            dependencies.push(deps);
        }

        Ok(Self {
            requests,
            index,
            dependencies,
        })
    }

    pub fn position(&self, request_id: &str) -> Option<usize> {
        self.index.get(request_id).copied()
    }

    pub fn request(&self, position: usize) -> &'a DataSourceRequest {
        &self.requests[position]
    }

    /// Requests no other request depends on.
    pub fn roots(&self) -> Vec<usize> {
        let mut depended_on = vec![false; self.requests.len()];
        for deps in &self.dependencies {
            for &dep in deps {
                depended_on[dep] = true;
            }
        }
        (0..self.requests.len())
            .filter(|&i| !depended_on[i])
            .collect()
    }

    /// Execution order for every request.
    ///
    /// The search starts from the roots; the remaining requests are swept afterwards so
    /// that a cycle with no root still gets reported.
    pub fn full_order(&self) -> Result<Vec<usize>, GraphError> {
        let starts = self.roots().into_iter().chain(0..self.requests.len());
        self.order_from(starts)
    }

    /// Execution order for the transitive dependencies of `starts`, dependencies first.
    pub fn order_from(
        &self,
        starts: impl IntoIterator<Item = usize>,
    ) -> Result<Vec<usize>, GraphError> {
        let mut marks = vec![Mark::Unvisited; self.requests.len()];
        let mut order = Vec::with_capacity(self.requests.len());
        for start in starts {
            self.visit(start, &mut marks, &mut order)?;
        }
        Ok(order)
    }

    // Post-order over dependency edges: a request is emitted only after all of its dependencies.
    fn visit(
        &self,
        node: usize,
        marks: &mut [Mark],
        order: &mut Vec<usize>,
    ) -> Result<(), GraphError> {
        match marks[node] {
            Mark::Done => return Ok(()),
            Mark::InProgress => return Err(GraphError::Cycle(self.requests[node].id.clone())),
            Mark::Unvisited => {}
        }
        marks[node] = Mark::InProgress;
        for &dep in &self.dependencies[node] {
            self.visit(dep, marks, order)?;
        }
        marks[node] = Mark::Done;
        order.push(node);
        Ok(())
    }
}
