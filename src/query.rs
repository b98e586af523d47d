//! The GraphQL document sent with every search.
//!
//! The gateway rejects the whole batch when a fragment it expects is missing,
//! so the document is kept verbatim as captured from the web client and never
//! assembled per request.

/// Operation name, sent both in the body and as the `opname` query parameter.
pub const OPERATION_NAME: &str = "Search";

pub const SEARCH_DOCUMENT: &str = r#"query Search($requests: [Search_Request!]!) {
  SearchResult {
    search(requests: $requests) {
      ...SearchResult
      __typename
    }
    __typename
  }
}

fragment SearchResult on Search_Result {
  elements {
    ...SearchHit
    __typename
  }
  facets {
    ...SearchFacets
    __typename
  }
  pagination {
    cursor
    totalElements
    __typename
  }
  totalPages
  source {
    indexName
    recommender {
      context
      hash
      __typename
    }
    __typename
  }
  __typename
}

fragment SearchHit on Search_Hit {
  ...SearchArticleHit
  ...SearchProductHit
  ...SearchSuggestionHit
  __typename
}

fragment SearchArticleHit on Search_ArticleHit {
  aeName
  careerField
  category
  createdByName
  firstPublishedAt
  id
  internalContentEpic
  internalProductLine
  internalTargetKw
  introduction
  islocalized
  lastPublishedAt
  localizedCountryCd
  localizedLanguageCd
  name
  subcategory
  topics
  url
  skill: skills
  __typename
}

fragment SearchProductHit on Search_ProductHit {
  avgProductRating
  cobrandingEnabled
  completions
  duration
  id
  imageUrl
  isCourseFree
  isCreditEligible
  isNewContent
  isPartOfCourseraPlus
  name
  numProductRatings
  parentCourseName
  parentLessonName
  partnerLogos
  partners
  productCard {
    ...SearchProductCard
    __typename
  }
  productDifficultyLevel
  productDuration
  productType
  skills
  url
  videosInLesson
  translatedName
  translatedSkills
  translatedParentCourseName
  translatedParentLessonName
  tagline
  __typename
}

fragment SearchSuggestionHit on Search_SuggestionHit {
  id
  name
  score
  __typename
}

fragment SearchProductCard on ProductCard_ProductCard {
  id
  canonicalType
  marketingProductType
  productTypeAttributes {
    ... on ProductCard_Specialization {
      ...SearchProductCardSpecialization
      __typename
    }
    ... on ProductCard_Course {
      ...SearchProductCardCourse
      __typename
    }
    ... on ProductCard_Clip {
      ...SearchProductCardClip
      __typename
    }
    ... on ProductCard_Degree {
      ...SearchProductCardDegree
      __typename
    }
    __typename
  }
  __typename
}

fragment SearchProductCardSpecialization on ProductCard_Specialization {
  isPathwayContent
  __typename
}

fragment SearchProductCardCourse on ProductCard_Course {
  isPathwayContent
  rating
  reviewCount
  __typename
}

fragment SearchProductCardClip on ProductCard_Clip {
  canonical {
    id
    __typename
  }
  __typename
}

fragment SearchProductCardDegree on ProductCard_Degree {
  canonical {
    id
    __typename
  }
  __typename
}

fragment SearchFacets on Search_Facet {
  name
  nameDisplay
  valuesAndCounts {
    ...ValuesAndCounts
    __typename
  }
  __typename
}

fragment ValuesAndCounts on Search_FacetValueAndCount {
  count
  value
  valueDisplay
  __typename
}"#;
