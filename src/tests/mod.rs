mod searcher;
